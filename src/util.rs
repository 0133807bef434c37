// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" CSV value handling so the rest of the
// code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Parse a quantity field into `u64` while being forgiving about formatting
/// issues that are common in CSV exports (thousands separators, spaces).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and strips grouping commas (`"1,000"` -> `1000`).
/// - Rejects values containing alphabetic characters or a sign.
/// - Returns `None` for anything that cannot be safely parsed; callers keep
///   the row and treat the value as unknown (summed as 0).
pub fn parse_quantity(s: Option<&str>) -> Option<u64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<u64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    // `?` propagates `None` early if the option is missing.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // CSV dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Calendar-year extraction for sources that carry a `Date` column instead
/// of a `Year` column.
pub fn year_from_date(s: Option<&str>) -> Option<i32> {
    parse_date_safe(s).map(|d| d.year())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_strips_thousands_separators() {
        assert_eq!(parse_quantity(Some("1,000")), Some(1000));
        assert_eq!(parse_quantity(Some(" 12,345,678 ")), Some(12_345_678));
        assert_eq!(parse_quantity(Some("50")), Some(50));
    }

    #[test]
    fn quantity_rejects_junk() {
        assert_eq!(parse_quantity(Some("n/a")), None);
        assert_eq!(parse_quantity(Some("")), None);
        assert_eq!(parse_quantity(Some("-5")), None);
        assert_eq!(parse_quantity(None), None);
    }

    #[test]
    fn year_derived_from_date_column() {
        assert_eq!(year_from_date(Some("2023-07-14")), Some(2023));
        assert_eq!(year_from_date(Some("not a date")), None);
        assert_eq!(year_from_date(None), None);
    }
}
