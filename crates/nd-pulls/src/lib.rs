//! Pull definitions for postfit nuisance parameters.
//!
//! A pull definition maps `(postfit value, prefit mean, postfit errors,
//! prefit errors)` to a `(pull, err_lo, err_hi)` triple. Definitions are
//! looked up by name in a [`PullRegistry`]; the set is open, callers may
//! register their own.

pub mod definition;
pub mod methods;
pub mod registry;

pub use definition::{PullDefinition, PullInputs, PullValue};
pub use methods::{DiffPullAsym, RelDiffAsymErrs, UnconstPullAsym};
pub use registry::PullRegistry;
