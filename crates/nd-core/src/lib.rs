//! # nd-core
//!
//! Core types for nuisdiff.
//!
//! Holds the error type shared by every crate, the snapshot data model
//! (prefit / fit-B / fit-S parameter states) and the traits that the
//! comparison engine uses to talk to external collaborators.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::LikelihoodWorkspace;
pub use types::{
    CorrelationMatrix, FitSnapshot, ParameterSnapshot, PrefitSnapshot, SYMMETRY_TOLERANCE, SnapshotSet,
};

/// Crate version, reported in run headers and artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
