use returns_report::loader::{self, LoadError};
use returns_report::types::Month;
use returns_report::{aggregate, reports};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const TOTAL_SOLD: &str = "\
SKU,Year,Quantity
WIDGET-A,2023,\"1,000\"
WIDGET-B,2023,400
GADGET-C,2023,0
WIDGET-A,2024,500
";

const RETURNS: &str = "\
SKU,Year,Month,Reason,Quantity
WIDGET-A,2023,January,Defective,50
WIDGET-A,2023,January,Wrong Size,50
WIDGET-B,2023,March,Changed Mind,10
GADGET-C,2023,June,Damaged,3
WIDGET-A,2024,February,Defective,20
";

fn write_combined(dir: &Path) {
    fs::write(dir.join("total_sold.csv"), TOTAL_SOLD).unwrap();
    fs::write(dir.join("returns.csv"), RETURNS).unwrap();
}

// ---------------------------------------------------------------------------
// Combined layout, end to end
// ---------------------------------------------------------------------------

#[test]
fn combined_layout_worked_example() {
    let tmp = TempDir::new().unwrap();
    write_combined(tmp.path());

    let (tables, report) = loader::load_combined_dir(tmp.path()).unwrap();
    assert_eq!(report.parse_warnings, 0);
    assert_eq!(tables.sales.len(), 4);
    assert_eq!(tables.returns.len(), 5);

    let dashboard = reports::dashboard_for_year(&tables, 2023);

    // The "1,000 sold / 100 returned" worked example.
    let a = dashboard.sku_summary.iter().find(|r| r.sku == "WIDGET-A").unwrap();
    assert_eq!(a.total_sold, 1000);
    assert_eq!(a.total_returned, 100);
    assert!((a.percentage_returns - 10.0).abs() < 1e-9);
    assert!(a.rate_defined);

    // Zero units sold: rate is flagged undefined rather than reported as 0%.
    let c = dashboard.sku_summary.iter().find(|r| r.sku == "GADGET-C").unwrap();
    assert_eq!(c.total_returned, 3);
    assert!(!c.rate_defined);

    // 50/50 tie on WIDGET-A picks the lexicographically first reason.
    let top_a = dashboard
        .top_reason_rows
        .iter()
        .find(|r| r.sku == "WIDGET-A")
        .unwrap();
    assert_eq!(top_a.reason, "Defective");

    // Comparison covers both years present in returns, zero-filled.
    assert_eq!(dashboard.comparison.len(), 2);
    let y2024 = &dashboard.comparison[&2024];
    assert_eq!(y2024.len(), 12);
    assert_eq!(y2024[Month::March as usize], (Month::March, 0));
    assert_eq!(y2024[Month::February as usize], (Month::February, 20));
}

#[test]
fn missing_returns_file_is_a_load_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("total_sold.csv"), TOTAL_SOLD).unwrap();

    let err = loader::load_combined_dir(tmp.path()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn reordered_input_rows_produce_identical_results() {
    let tmp = TempDir::new().unwrap();
    write_combined(tmp.path());
    let (tables, _) = loader::load_combined_dir(tmp.path()).unwrap();

    let mut shuffled = tables.clone();
    shuffled.sales.reverse();
    shuffled.returns.reverse();

    let a = reports::dashboard_for_year(&tables, 2023);
    let b = reports::dashboard_for_year(&shuffled, 2023);

    assert_eq!(
        a.sku_summary.iter().map(|r| (&r.sku, r.total_returned)).collect::<Vec<_>>(),
        b.sku_summary.iter().map(|r| (&r.sku, r.total_returned)).collect::<Vec<_>>()
    );
    assert_eq!(a.ranked_reasons, b.ranked_reasons);
    assert_eq!(a.top_reason_rows, b.top_reason_rows);
    assert_eq!(a.comparison, b.comparison);
}

// ---------------------------------------------------------------------------
// Per-period layout
// ---------------------------------------------------------------------------

#[test]
fn per_month_files_load_with_derived_year_and_month() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Total-Sold-2023.csv"),
        "SKU,Quantity\nWIDGET-A,\"1,000\"\nWIDGET-B,400\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("January.csv"),
        "SKU,Reason,Quantity\nWIDGET-A,Defective,50\nWIDGET-A,Wrong Size,50\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("March.csv"),
        "SKU,Reason,Quantity\nWIDGET-B,Changed Mind,10\n",
    )
    .unwrap();

    let (tables, _) = loader::load_year_dir(tmp.path(), 2023).unwrap();
    assert_eq!(tables.sales.len(), 2);
    assert_eq!(tables.returns.len(), 3);
    assert!(tables.sales.iter().all(|s| s.year == 2023));
    assert!(tables.returns.iter().all(|r| r.year == 2023));
    assert_eq!(tables.returns[0].month, Month::January);
    assert_eq!(tables.returns[2].month, Month::March);
}

#[test]
fn per_month_files_aggregate_like_one_combined_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Total-Sold-2023.csv"),
        "SKU,Quantity\nWIDGET-A,1000\nWIDGET-B,400\nGADGET-C,0\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("January.csv"),
        "SKU,Reason,Quantity\nWIDGET-A,Defective,50\nWIDGET-A,Wrong Size,50\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("March.csv"),
        "SKU,Reason,Quantity\nWIDGET-B,Changed Mind,10\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("June.csv"),
        "SKU,Reason,Quantity\nGADGET-C,Damaged,3\n",
    )
    .unwrap();
    let (split_tables, _) = loader::load_year_dir(tmp.path(), 2023).unwrap();

    let combined = TempDir::new().unwrap();
    write_combined(combined.path());
    let (combined_tables, _) = loader::load_combined_dir(combined.path()).unwrap();
    let combined_2023 = aggregate::returns_for_year(&combined_tables.returns, 2023);

    assert_eq!(
        aggregate::by_sku(&split_tables.returns),
        aggregate::by_sku(&combined_2023)
    );
    assert_eq!(
        aggregate::by_sku_reason(&split_tables.returns),
        aggregate::by_sku_reason(&combined_2023)
    );
    assert_eq!(
        aggregate::by_sku_month_reason(&split_tables.returns),
        aggregate::by_sku_month_reason(&combined_2023)
    );
}

#[test]
fn year_dir_without_sales_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("January.csv"),
        "SKU,Reason,Quantity\nWIDGET-A,Defective,50\n",
    )
    .unwrap();

    let err = loader::load_year_dir(tmp.path(), 2023).unwrap_err();
    assert!(matches!(err, LoadError::MissingSource { .. }));
}

#[test]
fn stray_file_without_month_name_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Total-Sold-2023.csv"),
        "SKU,Quantity\nWIDGET-A,10\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("notes.csv"),
        "SKU,Reason,Quantity\nWIDGET-A,Defective,1\n",
    )
    .unwrap();

    let err = loader::load_year_dir(tmp.path(), 2023).unwrap_err();
    assert!(matches!(err, LoadError::UnknownMonth { .. }));
}

// ---------------------------------------------------------------------------
// Search flow
// ---------------------------------------------------------------------------

#[test]
fn search_over_loaded_tables_is_scoped_and_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    write_combined(tmp.path());
    let (tables, _) = loader::load_combined_dir(tmp.path()).unwrap();

    let result = reports::search(&tables, "widget", 2023);
    assert_eq!(result.sku_summary.len(), 2);
    assert!(result.sku_summary.iter().all(|r| r.sku.starts_with("WIDGET")));
    assert_eq!(result.top_reasons.len(), 3);
    assert_eq!(result.top_reasons[0].reason, "Defective");

    let empty = reports::search(&tables, "zzz", 2023);
    assert!(empty.sku_summary.is_empty());
    assert!(empty.top_reasons.is_empty());
}
