use crate::aggregate::{
    self, filter_returns_by_sku, filter_sales_by_sku, returns_for_year, sales_for_year,
};
use crate::types::{
    DashboardStats, Month, MonthlySeriesRow, ReasonSummary, ReturnRecord, ReturnsTables,
    ScopeReasonRow, SkuSummary,
};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Year-keyed, calendar-ordered matrix of monthly return totals.
pub type MonthlyMatrix = BTreeMap<i32, Vec<(Month, u64)>>;

/// Left join of sales totals with return totals, one row per SKU sold.
///
/// SKUs that only appear on the returns side have no denominator for a rate,
/// so they are excluded here and surfaced via `log::warn!` instead of being
/// silently lost. When `total_sold` is 0 the percentage is reported as 0.0
/// with `rate_defined = false` so callers can tell it apart from a true 0%
/// rate. Rows come back sorted by descending `total_returned`; the sort is
/// stable, so equal counts keep the lexicographic SKU order of the input map.
pub fn compute_sku_summary(
    sales_totals: &BTreeMap<String, u64>,
    return_totals: &BTreeMap<String, u64>,
) -> Vec<SkuSummary> {
    for (sku, qty) in return_totals {
        if !sales_totals.contains_key(sku) {
            warn!(
                "SKU {} has {} returned units but no sales row; excluded from summary",
                sku, qty
            );
        }
    }

    let mut rows: Vec<SkuSummary> = sales_totals
        .iter()
        .map(|(sku, &total_sold)| {
            let total_returned = return_totals.get(sku).copied().unwrap_or(0);
            let rate_defined = total_sold > 0;
            let percentage_returns = if rate_defined {
                (total_returned as f64 / total_sold as f64) * 100.0
            } else {
                0.0
            };
            SkuSummary {
                sku: sku.clone(),
                total_sold,
                total_returned,
                percentage_returns,
                rate_defined,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_returned.cmp(&a.total_returned));
    rows
}

/// The reason with the maximum summed quantity for each SKU.
///
/// Ties pick the lexicographically first reason, so the result is identical
/// however the underlying rows were ordered.
pub fn top_reason_per_sku(
    aggregated: &BTreeMap<(String, String), u64>,
) -> BTreeMap<String, String> {
    let mut best: BTreeMap<String, (String, u64)> = BTreeMap::new();
    // Keys iterate (sku, reason) in lexicographic order, so a strictly-greater
    // comparison leaves the first reason in place on equal quantities.
    for ((sku, reason), &qty) in aggregated {
        match best.get(sku) {
            Some((_, best_qty)) if qty <= *best_qty => {}
            _ => {
                best.insert(sku.clone(), (reason.clone(), qty));
            }
        }
    }
    best.into_iter().map(|(sku, (reason, _))| (sku, reason)).collect()
}

/// Same selection rule as [`top_reason_per_sku`], scoped per (SKU, Month).
pub fn top_reason_per_sku_month(
    aggregated: &BTreeMap<(String, Month, String), u64>,
) -> BTreeMap<(String, Month), String> {
    let mut best: BTreeMap<(String, Month), (String, u64)> = BTreeMap::new();
    for ((sku, month, reason), &qty) in aggregated {
        let key = (sku.clone(), *month);
        match best.get(&key) {
            Some((_, best_qty)) if qty <= *best_qty => {}
            _ => {
                best.insert(key, (reason.clone(), qty));
            }
        }
    }
    best.into_iter().map(|(key, (reason, _))| (key, reason)).collect()
}

/// Full (SKU, Reason) ranking by descending quantity, ties broken by Reason
/// then SKU, truncated to `limit` rows.
pub fn ranked_reasons(
    aggregated: &BTreeMap<(String, String), u64>,
    limit: usize,
) -> Vec<ReasonSummary> {
    let mut rows: Vec<ReasonSummary> = aggregated
        .iter()
        .map(|((sku, reason), &qty)| ReasonSummary {
            sku: sku.clone(),
            reason: reason.clone(),
            quantity_returned: qty,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.quantity_returned
            .cmp(&a.quantity_returned)
            .then_with(|| a.reason.cmp(&b.reason))
            .then_with(|| a.sku.cmp(&b.sku))
    });
    rows.truncate(limit);
    rows
}

/// Reason totals collapsed across every SKU in the (pre-filtered) scope,
/// ranked descending, top `limit`. This is the search view's reason table.
pub fn top_reasons_for_scope(returns: &[ReturnRecord], limit: usize) -> Vec<ScopeReasonRow> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for r in returns {
        *totals.entry(r.reason.clone()).or_insert(0) += r.quantity.unwrap_or(0);
    }
    let mut rows: Vec<ScopeReasonRow> = totals
        .into_iter()
        .map(|(reason, quantity_returned)| ScopeReasonRow {
            reason,
            quantity_returned,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.quantity_returned
            .cmp(&a.quantity_returned)
            .then_with(|| a.reason.cmp(&b.reason))
    });
    rows.truncate(limit);
    rows
}

/// Month-by-year return totals for year-over-year comparison.
///
/// Every requested year gets all 12 months in calendar order; a month with no
/// rows is a true zero, indistinguishable from an observed zero.
pub fn build_monthly_matrix(
    returns: &[ReturnRecord],
    years: &BTreeSet<i32>,
) -> MonthlyMatrix {
    let mut matrix: MonthlyMatrix = years
        .iter()
        .map(|&y| (y, Month::ALL.iter().map(|&m| (m, 0)).collect()))
        .collect();
    for r in returns {
        if let Some(months) = matrix.get_mut(&r.year) {
            months[r.month as usize].1 += r.quantity.unwrap_or(0);
        }
    }
    matrix
}

/// Flattens a matrix into per-cell rows for CSV export and table previews.
pub fn flatten_matrix(matrix: &MonthlyMatrix) -> Vec<MonthlySeriesRow> {
    matrix
        .iter()
        .flat_map(|(&year, months)| {
            months.iter().map(move |&(month, quantity_returned)| MonthlySeriesRow {
                year,
                month,
                quantity_returned,
            })
        })
        .collect()
}

/// The three dashboard views for one selected year.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub year: i32,
    pub sku_summary: Vec<SkuSummary>,
    pub ranked_reasons: Vec<ReasonSummary>,
    pub top_reason_rows: Vec<ReasonSummary>,
    pub comparison: MonthlyMatrix,
}

/// Runs the full pipeline for one year: SKU summary, ranked reasons with the
/// per-SKU winner, and the cross-year monthly comparison over every year
/// present in the returns table.
pub fn dashboard_for_year(tables: &ReturnsTables, year: i32) -> DashboardReport {
    let year_sales = sales_for_year(&tables.sales, year);
    let year_returns = returns_for_year(&tables.returns, year);

    let sales_totals = aggregate::sales_by_sku(&year_sales);
    let return_totals = aggregate::by_sku(&year_returns);
    let sku_summary = compute_sku_summary(&sales_totals, &return_totals);

    let by_reason = aggregate::by_sku_reason(&year_returns);
    let ranked = ranked_reasons(&by_reason, usize::MAX);
    let top_reason_rows = top_reason_per_sku(&by_reason)
        .into_iter()
        .map(|(sku, reason)| {
            let quantity_returned = by_reason
                .get(&(sku.clone(), reason.clone()))
                .copied()
                .unwrap_or(0);
            ReasonSummary {
                sku,
                reason,
                quantity_returned,
            }
        })
        .collect();

    let years: BTreeSet<i32> = tables.returns.iter().map(|r| r.year).collect();
    let comparison = build_monthly_matrix(&tables.returns, &years);

    DashboardReport {
        year,
        sku_summary,
        ranked_reasons: ranked,
        top_reason_rows,
        comparison,
    }
}

pub fn summary_stats(report: &DashboardReport) -> DashboardStats {
    let total_sold: u64 = report.sku_summary.iter().map(|r| r.total_sold).sum();
    let total_returned: u64 = report.sku_summary.iter().map(|r| r.total_returned).sum();
    let overall_return_rate = if total_sold > 0 {
        (total_returned as f64 / total_sold as f64) * 100.0
    } else {
        0.0
    };
    DashboardStats {
        year: report.year,
        skus: report.sku_summary.len(),
        total_sold,
        total_returned,
        overall_return_rate,
        undefined_rates: report.sku_summary.iter().filter(|r| !r.rate_defined).count(),
    }
}

/// SKU-substring search results for one year. Empty rows mean the scope
/// matched nothing, which is a valid result, not a failure.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub year: i32,
    pub query: String,
    pub sku_summary: Vec<SkuSummary>,
    pub top_reasons: Vec<ScopeReasonRow>,
}

/// Search view: case-insensitive SKU substring scope, then the same summary
/// join plus the top 5 return reasons inside the scope.
pub fn search(tables: &ReturnsTables, query: &str, year: i32) -> SearchReport {
    let scoped_sales = sales_for_year(&filter_sales_by_sku(&tables.sales, query), year);
    let scoped_returns = returns_for_year(&filter_returns_by_sku(&tables.returns, query), year);

    let sku_summary = compute_sku_summary(
        &aggregate::sales_by_sku(&scoped_sales),
        &aggregate::by_sku(&scoped_returns),
    );
    let top_reasons = top_reasons_for_scope(&scoped_returns, 5);

    SearchReport {
        year,
        query: query.trim().to_string(),
        sku_summary,
        top_reasons,
    }
}
