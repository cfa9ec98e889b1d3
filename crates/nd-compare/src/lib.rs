//! # nd-compare
//!
//! Comparison engine: turns prefit / fit-B / fit-S snapshots into a table of
//! severity-flagged rows.
//!
//! Pipeline: [`CompareConfig::resolve`] checks the options once, then
//! [`TableBuilder`] evaluates shifts ([`shift`]), impacts ([`impact`]) and
//! retention for every parameter, and [`sort::sort_rows`] orders the result.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Options, tolerances and their validation.
pub mod config;
/// Approximate impact on the POI and likelihood differences.
pub mod impact;
/// Prefit-relative shifts and severity classification.
pub mod shift;
/// Row ordering.
pub mod sort;
/// Row assembly and retention.
pub mod table;

pub use config::{ComparePlan, CompareConfig, SortKey, ToleranceConfig};
pub use impact::ValueOverride;
pub use shift::{Severity, Shift, SideResult};
pub use sort::{sort_evaluated, sort_rows};
pub use table::{ComparisonRow, ComparisonTable, Side, TableBuilder};
