// Entry point and high-level CLI flow.
//
// The binary is the presentation layer around the pipeline:
// - Option [1] loads the sales/returns CSVs, printing diagnostics.
// - Option [2] runs the dashboard for a chosen year and exports the tables.
// - Option [3] runs a SKU search across the two most recent years.
//
// Raw tables are loaded once and replaced wholesale on reload; every report
// is recomputed from them on demand.

use once_cell::sync::Lazy;
use returns_report::loader::{self, LoadReport};
use returns_report::reports;
use returns_report::types::{MonthlySeriesRow, ReturnsTables};
use returns_report::{output, util};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { tables: None }));

struct AppState {
    tables: Option<ReturnsTables>,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the raw tables from a data directory.
///
/// A directory holding `total_sold.csv` and `returns.csv` is the combined
/// layout; otherwise each subdirectory named after a year is loaded as a
/// per-month grouping (`Total-Sold-<year>.csv` plus one file per month).
fn handle_load() {
    let input = read_line("Data directory [data]: ");
    let dir = if input.is_empty() { "data".to_string() } else { input };
    let dir = Path::new(&dir);

    let loaded = if dir.join("total_sold.csv").exists() {
        loader::load_combined_dir(dir)
    } else {
        load_year_groupings(dir)
    };

    match loaded {
        Ok((tables, report)) => {
            println!(
                "Processing dataset... ({} rows seen, {} sale rows, {} return rows)",
                util::format_int(report.total_rows as i64),
                util::format_int(tables.sales.len() as i64),
                util::format_int(tables.returns.len() as i64)
            );
            if report.parse_warnings > 0 {
                println!(
                    "Note: {} quantity values could not be parsed and count as 0.",
                    util::format_int(report.parse_warnings as i64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.tables = Some(tables);
        }
        Err(e) => {
            eprintln!("No data available: {}\n", e);
        }
    }
}

/// Per-period layout: every subdirectory whose name parses as a year.
fn load_year_groupings(dir: &Path) -> Result<(ReturnsTables, LoadReport), loader::LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| loader::LoadError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut year_dirs: Vec<(i32, std::path::PathBuf)> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let year = p.file_name()?.to_str()?.parse::<i32>().ok()?;
            Some((year, p))
        })
        .collect();
    year_dirs.sort();
    if year_dirs.is_empty() {
        return Err(loader::LoadError::MissingSource {
            what: "year directories or total_sold.csv",
            path: dir.to_path_buf(),
        });
    }

    let mut tables = ReturnsTables::default();
    let mut report = LoadReport::default();
    for (year, path) in year_dirs {
        let (t, r) = loader::load_year_dir(&path, year)?;
        tables.sales.extend(t.sales);
        tables.returns.extend(t.returns);
        report.total_rows += r.total_rows;
        report.loaded_rows += r.loaded_rows;
        report.parse_warnings += r.parse_warnings;
    }
    Ok((tables, report))
}

fn cached_tables() -> Option<ReturnsTables> {
    let state = APP_STATE.lock().unwrap();
    state.tables.clone()
}

/// Handle option [2]: dashboard for a chosen year.
fn handle_dashboard() {
    let Some(tables) = cached_tables() else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };
    let Ok(year) = read_line("Select year: ").parse::<i32>() else {
        println!("Invalid year.\n");
        return;
    };

    println!("\nGenerating reports...\n");
    let report = reports::dashboard_for_year(&tables, year);

    output::preview_table(&format!("SKU Details ({})", year), &report.sku_summary, 10);
    if let Err(e) = output::write_csv("sku_summary.csv", &report.sku_summary) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to sku_summary.csv)\n");

    output::preview_table(
        &format!("Top Reasons for Returns ({})", year),
        &report.ranked_reasons,
        10,
    );
    if let Err(e) = output::write_csv("top_reasons.csv", &report.ranked_reasons) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to top_reasons.csv)\n");

    output::preview_table(
        &format!("Top Reason per SKU ({})", year),
        &report.top_reason_rows,
        10,
    );

    let comparison_rows = comparison_rows_for(&report.comparison, year);
    output::preview_table("Month-over-Month Returns Comparison", &comparison_rows, 24);
    let all_rows = reports::flatten_matrix(&report.comparison);
    if let Err(e) = output::write_csv("returns_comparison.csv", &all_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("(All years exported to returns_comparison.csv)\n");

    let stats = reports::summary_stats(&report);
    if let Err(e) = output::write_json("summary.json", &stats) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Summary (summary.json): {} SKUs, {} sold, {} returned ({:.2}%)\n",
        util::format_int(stats.skus as i64),
        util::format_int(stats.total_sold as i64),
        util::format_int(stats.total_returned as i64),
        stats.overall_return_rate
    );
}

/// Selected year first, previous year after it when present in the matrix.
fn comparison_rows_for(matrix: &reports::MonthlyMatrix, year: i32) -> Vec<MonthlySeriesRow> {
    let mut rows = Vec::new();
    for y in [year, year - 1] {
        if let Some(months) = matrix.get(&y) {
            for &(month, quantity_returned) in months {
                rows.push(MonthlySeriesRow {
                    year: y,
                    month,
                    quantity_returned,
                });
            }
        } else if y == year {
            println!("No return data available for the year {}.", y);
        }
    }
    rows
}

/// Handle option [3]: SKU search across the two most recent years.
fn handle_search() {
    let Some(tables) = cached_tables() else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };
    let query = read_line("Enter SKU for search: ");
    if query.is_empty() {
        println!("Empty query.\n");
        return;
    }

    let years: BTreeSet<i32> = tables.returns.iter().map(|r| r.year).collect();
    let recent: Vec<i32> = years.into_iter().rev().take(2).collect();
    if recent.is_empty() {
        println!("No return data loaded.\n");
        return;
    }

    for year in recent {
        let result = reports::search(&tables, &query, year);
        output::preview_table(
            &format!("\n{} Sales and Returns Data", year),
            &result.sku_summary,
            10,
        );
        output::preview_table(
            &format!("Top 5 Reasons for Returns in {}", year),
            &result.top_reasons,
            5,
        );
    }
}

fn main() {
    env_logger::init();
    loop {
        println!("Customer Returns Dashboard");
        println!("[1] Load data");
        println!("[2] Generate reports for a year");
        println!("[3] SKU search");
        println!("[4] Exit\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(),
            "2" => {
                handle_dashboard();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                handle_search();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1-4.\n");
            }
        }
    }
}
