//! Grouping sums over the normalized tables.
//!
//! All maps are `BTreeMap` so iteration order is the key order, which the
//! report layer relies on for deterministic tie-breaking. Unknown quantities
//! (`None`) sum as 0; the row still exists, it just contributes nothing.

use crate::types::{Month, ReturnRecord, SaleRecord};
use std::collections::BTreeMap;

pub fn by_sku(returns: &[ReturnRecord]) -> BTreeMap<String, u64> {
    let mut map = BTreeMap::new();
    for r in returns {
        *map.entry(r.sku.clone()).or_insert(0) += r.quantity.unwrap_or(0);
    }
    map
}

pub fn by_sku_reason(returns: &[ReturnRecord]) -> BTreeMap<(String, String), u64> {
    let mut map = BTreeMap::new();
    for r in returns {
        *map.entry((r.sku.clone(), r.reason.clone())).or_insert(0) +=
            r.quantity.unwrap_or(0);
    }
    map
}

pub fn by_sku_month_reason(
    returns: &[ReturnRecord],
) -> BTreeMap<(String, Month, String), u64> {
    let mut map = BTreeMap::new();
    for r in returns {
        *map.entry((r.sku.clone(), r.month, r.reason.clone()))
            .or_insert(0) += r.quantity.unwrap_or(0);
    }
    map
}

pub fn sales_by_sku(sales: &[SaleRecord]) -> BTreeMap<String, u64> {
    let mut map = BTreeMap::new();
    for s in sales {
        *map.entry(s.sku.clone()).or_insert(0) += s.quantity.unwrap_or(0);
    }
    map
}

pub fn returns_for_year(returns: &[ReturnRecord], year: i32) -> Vec<ReturnRecord> {
    returns.iter().filter(|r| r.year == year).cloned().collect()
}

pub fn sales_for_year(sales: &[SaleRecord], year: i32) -> Vec<SaleRecord> {
    sales.iter().filter(|s| s.year == year).cloned().collect()
}

/// Case-insensitive substring match anywhere in the SKU.
fn sku_matches(sku: &str, needle: &str) -> bool {
    sku.to_lowercase().contains(needle)
}

pub fn filter_returns_by_sku(returns: &[ReturnRecord], query: &str) -> Vec<ReturnRecord> {
    let needle = query.trim().to_lowercase();
    returns
        .iter()
        .filter(|r| sku_matches(&r.sku, &needle))
        .cloned()
        .collect()
}

pub fn filter_sales_by_sku(sales: &[SaleRecord], query: &str) -> Vec<SaleRecord> {
    let needle = query.trim().to_lowercase();
    sales
        .iter()
        .filter(|s| sku_matches(&s.sku, &needle))
        .cloned()
        .collect()
}
