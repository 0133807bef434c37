//! CSV record loaders.
//!
//! Two source layouts are supported:
//! - combined: one `total_sold.csv` and one `returns.csv`, each carrying a
//!   `Year` column (or a `Date` column it can be derived from);
//! - per-period: a directory per year where any file whose name contains
//!   `Total-Sold` is the sales table and every other CSV holds one calendar
//!   month of returns, the month taken from the file name.
//!
//! Rows with an unparseable quantity are kept with the quantity treated as
//! unknown; only missing identity columns (SKU, Year, Month, Reason) abort a
//! load.

use crate::types::{
    Month, RawReturnRow, RawSaleRow, ReturnRecord, ReturnsTables, SaleRecord,
};
use crate::util::{parse_i32_safe, parse_quantity, year_from_date};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: required column '{column}' is missing or empty")]
    MissingColumn { column: &'static str, row: usize },
    #[error("unrecognized month name '{name}'")]
    UnknownMonth { name: String },
    #[error("no {what} found in {path}")]
    MissingSource { what: &'static str, path: PathBuf },
}

/// Diagnostics from one load: how many rows were seen, how many survived,
/// and how many had a quantity that failed numeric coercion (kept as 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_warnings: usize,
}

impl LoadReport {
    fn absorb(&mut self, other: LoadReport) {
        self.total_rows += other.total_rows;
        self.loaded_rows += other.loaded_rows;
        self.parse_warnings += other.parse_warnings;
    }
}

pub fn load_sales<R: Read>(reader: R) -> Result<(Vec<SaleRecord>, LoadReport), LoadError> {
    read_sales(reader, None)
}

pub fn load_returns<R: Read>(reader: R) -> Result<(Vec<ReturnRecord>, LoadReport), LoadError> {
    read_returns(reader, None, None)
}

pub fn load_sales_file(path: &Path) -> Result<(Vec<SaleRecord>, LoadReport), LoadError> {
    let file = open(path)?;
    load_sales(file)
}

pub fn load_returns_file(path: &Path) -> Result<(Vec<ReturnRecord>, LoadReport), LoadError> {
    let file = open(path)?;
    load_returns(file)
}

/// Loads the combined layout: `total_sold.csv` + `returns.csv` under `dir`.
pub fn load_combined_dir(dir: &Path) -> Result<(ReturnsTables, LoadReport), LoadError> {
    let (sales, sales_report) = load_sales_file(&dir.join("total_sold.csv"))?;
    let (returns, returns_report) = load_returns_file(&dir.join("returns.csv"))?;
    let mut report = sales_report;
    report.absorb(returns_report);
    info!(
        "loaded combined dir {}: {} sale rows, {} return rows, {} parse warnings",
        dir.display(),
        sales.len(),
        returns.len(),
        report.parse_warnings
    );
    Ok((ReturnsTables { sales, returns }, report))
}

/// Loads the per-period layout for one year's directory.
///
/// Any CSV whose name contains `Total-Sold` (case-insensitive, `_` or `-`)
/// is treated as the sales table; every other CSV is a monthly returns file
/// whose month is derived from its name. Year and month values missing from
/// the files themselves fall back to the directory's declared year and the
/// file's derived month.
pub fn load_year_dir(dir: &Path, year: i32) -> Result<(ReturnsTables, LoadReport), LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(OsStr::to_str) == Some("csv"))
        .collect();
    paths.sort();

    let mut tables = ReturnsTables::default();
    let mut report = LoadReport::default();
    let mut saw_sales = false;

    for path in &paths {
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default();
        let file = open(path)?;
        if is_sales_file(stem) {
            let (sales, r) = read_sales(file, Some(year))?;
            tables.sales.extend(sales);
            report.absorb(r);
            saw_sales = true;
        } else {
            let month = Month::find_in(stem).ok_or_else(|| LoadError::UnknownMonth {
                name: stem.to_string(),
            })?;
            let (returns, r) = read_returns(file, Some(year), Some(month))?;
            tables.returns.extend(returns);
            report.absorb(r);
        }
    }

    if !saw_sales {
        return Err(LoadError::MissingSource {
            what: "Total-Sold file",
            path: dir.to_path_buf(),
        });
    }
    if tables.returns.is_empty() {
        warn!("no monthly return rows under {}", dir.display());
    }
    info!(
        "loaded year dir {} ({}): {} sale rows, {} return rows, {} parse warnings",
        dir.display(),
        year,
        tables.sales.len(),
        tables.returns.len(),
        report.parse_warnings
    );
    Ok((tables, report))
}

fn is_sales_file(stem: &str) -> bool {
    let lower = stem.to_lowercase();
    lower.contains("total-sold") || lower.contains("total_sold")
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_sales<R: Read>(
    reader: R,
    default_year: Option<i32>,
) -> Result<(Vec<SaleRecord>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (i, result) in rdr.deserialize::<RawSaleRow>().enumerate() {
        let row_no = i + 2; // header is line 1
        report.total_rows += 1;
        let row = result?;

        let sku = required(row.sku, "SKU", row_no)?;
        let year = parse_i32_safe(row.year.as_deref())
            .or_else(|| year_from_date(row.date.as_deref()))
            .or(default_year)
            .ok_or(LoadError::MissingColumn {
                column: "Year",
                row: row_no,
            })?;
        let month = match row.month.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => {
                Some(Month::from_name(m).ok_or_else(|| LoadError::UnknownMonth {
                    name: m.to_string(),
                })?)
            }
            _ => None,
        };
        let quantity = parse_quantity(row.quantity.as_deref());
        if quantity.is_none() {
            report.parse_warnings += 1;
            debug!("row {}: sale quantity for {} not numeric, kept as unknown", row_no, sku);
        }

        records.push(SaleRecord {
            sku,
            year,
            month,
            quantity,
        });
        report.loaded_rows += 1;
    }
    Ok((records, report))
}

fn read_returns<R: Read>(
    reader: R,
    default_year: Option<i32>,
    default_month: Option<Month>,
) -> Result<(Vec<ReturnRecord>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (i, result) in rdr.deserialize::<RawReturnRow>().enumerate() {
        let row_no = i + 2;
        report.total_rows += 1;
        let row = result?;

        let sku = required(row.sku, "SKU", row_no)?;
        let reason = required(row.reason, "Reason", row_no)?;
        let year = parse_i32_safe(row.year.as_deref())
            .or_else(|| year_from_date(row.date.as_deref()))
            .or(default_year)
            .ok_or(LoadError::MissingColumn {
                column: "Year",
                row: row_no,
            })?;
        let month = match row.month.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => {
                Month::from_name(m).ok_or_else(|| LoadError::UnknownMonth {
                    name: m.to_string(),
                })?
            }
            _ => default_month.ok_or(LoadError::MissingColumn {
                column: "Month",
                row: row_no,
            })?,
        };
        let quantity = parse_quantity(row.quantity.as_deref());
        if quantity.is_none() {
            report.parse_warnings += 1;
            debug!("row {}: return quantity for {} not numeric, kept as unknown", row_no, sku);
        }

        records.push(ReturnRecord {
            sku,
            year,
            month,
            reason,
            quantity,
        });
        report.loaded_rows += 1;
    }
    Ok((records, report))
}

fn required(
    value: Option<String>,
    column: &'static str,
    row: usize,
) -> Result<String, LoadError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(LoadError::MissingColumn { column, row }),
    }
}
