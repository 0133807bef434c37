use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Calendar month. Ordering is calendar order (`January < December`),
/// never lexicographic, so grouped results sort the way a chart expects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Case-insensitive lookup by English month name.
    pub fn from_name(s: &str) -> Option<Month> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
    }

    /// Finds a month name embedded anywhere in `s` (used for per-month file
    /// stems like `Returns-January` or `2023_March`).
    pub fn find_in(s: &str) -> Option<Month> {
        let lower = s.to_lowercase();
        Month::ALL
            .into_iter()
            .find(|m| lower.contains(&m.name().to_lowercase()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSaleRow {
    #[serde(rename = "SKU")]
    pub sku: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawReturnRow {
    #[serde(rename = "SKU")]
    pub sku: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Reason")]
    pub reason: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
}

/// Normalized units-sold observation. `quantity: None` means the raw value
/// failed numeric coercion; the row is kept and sums treat it as 0.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub sku: String,
    pub year: i32,
    pub month: Option<Month>,
    pub quantity: Option<u64>,
}

/// Normalized returned-units observation. Same `None`-as-unknown convention
/// for `quantity` as [`SaleRecord`].
#[derive(Debug, Clone)]
pub struct ReturnRecord {
    pub sku: String,
    pub year: i32,
    pub month: Month,
    pub reason: String,
    pub quantity: Option<u64>,
}

/// The immutable raw tables the whole pipeline reads from. Loaded once,
/// replaced wholesale on reload, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct ReturnsTables {
    pub sales: Vec<SaleRecord>,
    pub returns: Vec<ReturnRecord>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SkuSummary {
    #[serde(rename = "SKU")]
    #[tabled(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Total_Sold")]
    #[tabled(rename = "Total_Sold")]
    pub total_sold: u64,
    #[serde(rename = "Total_Returned")]
    #[tabled(rename = "Total_Returned")]
    pub total_returned: u64,
    #[serde(rename = "Percentage_Returns")]
    #[tabled(rename = "Percentage_Returns")]
    pub percentage_returns: f64,
    #[serde(rename = "Rate_Defined")]
    #[tabled(rename = "Rate_Defined")]
    pub rate_defined: bool,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct ReasonSummary {
    #[serde(rename = "SKU")]
    #[tabled(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Reason")]
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Quantity_Returned")]
    #[tabled(rename = "Quantity_Returned")]
    pub quantity_returned: u64,
}

/// Reason totals for a search scope, collapsed across SKUs.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct ScopeReasonRow {
    #[serde(rename = "Reason")]
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Quantity_Returned")]
    #[tabled(rename = "Quantity_Returned")]
    pub quantity_returned: u64,
}

/// One cell of the year-by-month comparison matrix, flattened for export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlySeriesRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: Month,
    #[serde(rename = "Quantity_Returned")]
    #[tabled(rename = "Quantity_Returned")]
    pub quantity_returned: u64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub year: i32,
    pub skus: usize,
    pub total_sold: u64,
    pub total_returned: u64,
    pub overall_return_rate: f64,
    pub undefined_rates: usize,
}
