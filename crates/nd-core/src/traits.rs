//! Core traits for nuisdiff
//!
//! The comparison engine does not know how a probability model is stored or
//! evaluated. It only needs the narrow capability below, which the
//! translation layer (or a test double) provides.

use crate::Result;

/// Model workspace able to evaluate a single nuisance constraint term.
///
/// Variables are shared mutable state: `set_value` changes what every later
/// `nll` call observes, so callers must restore the previous value.
pub trait LikelihoodWorkspace {
    /// Current value of a floating variable.
    fn value(&self, var: &str) -> Result<f64>;

    /// Overwrite the value of a floating variable.
    fn set_value(&mut self, var: &str, value: f64) -> Result<()>;

    /// Negative log-probability of `pdf`, normalized over `var`, at the current variable values.
    fn nll(&self, pdf: &str, var: &str) -> Result<f64>;

    /// Workspace name (used in logs)
    fn name(&self) -> &str;
}
