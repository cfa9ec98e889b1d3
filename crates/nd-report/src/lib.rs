//! # nd-report
//!
//! Presentation of a sorted comparison table: the human-readable report in
//! one of four markup dialects, and a plot-friendly JSON artifact.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Plot-data artifact (pull pages, shift histogram, dnll ranking).
pub mod artifact;
/// Output dialects and their markup.
pub mod dialect;
/// Table rendering.
pub mod format;

pub use artifact::{NuisanceArtifact, nuisance_artifact, now_unix_ms};
pub use dialect::Dialect;
pub use format::{Columns, render_table, run_header};
