//! Returns reporting pipeline: loads retail sales and product-return CSVs,
//! joins and aggregates them by SKU, month and reason, and hands plain
//! tabular results to whatever presentation layer asked for them.
//!
//! Everything downstream of the loader is a pure transformation over the
//! immutable raw tables; each query recomputes a fresh result set.

pub mod aggregate;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
