//! # nd-translate
//!
//! Readers for the inputs of a nuisance comparison:
//! - [`fit_file`]: fit-B / fit-S results and the prefit snapshot,
//! - [`workspace`]: a JSON likelihood workspace of per-nuisance constraint pdfs.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Stored fit results and prefit snapshot.
pub mod fit_file;
/// JSON likelihood workspace.
pub mod workspace;

pub use fit_file::FitFile;
pub use workspace::{ConstraintPdf, JsonWorkspace, WorkspaceVariable};
