//! Pull-definition trait and its value types.

/// Inputs of a pull computation. All errors are magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullInputs {
    /// Postfit central value
    pub value: f64,
    /// Prefit mean
    pub mean: f64,
    /// Postfit high-side error
    pub err_hi: f64,
    /// Prefit high-side error
    pub prefit_err_hi: f64,
    /// Postfit low-side error
    pub err_lo: f64,
    /// Prefit low-side error
    pub prefit_err_lo: f64,
}

impl PullInputs {
    /// Signed displacement from the prefit mean.
    pub fn delta(&self) -> f64 {
        self.value - self.mean
    }

    /// `true` when the postfit value sits above the prefit mean.
    pub fn above_mean(&self) -> bool {
        self.value > self.mean
    }
}

/// Pull with asymmetric error bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullValue {
    /// Pull
    pub pull: f64,
    /// Low-side error on the pull
    pub err_lo: f64,
    /// High-side error on the pull
    pub err_hi: f64,
}

impl PullValue {
    /// Create a pull value
    pub fn new(pull: f64, err_lo: f64, err_hi: f64) -> Self {
        Self { pull, err_lo, err_hi }
    }

    /// Pull with unit errors, as produced by definitions already expressed in sigma units.
    pub fn unit(pull: f64) -> Self {
        Self::new(pull, 1.0, 1.0)
    }

    /// Placeholder for a pull whose denominator is not positive.
    pub fn undefined() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// A named pull formula.
pub trait PullDefinition: Send + Sync {
    /// Registry key (e.g. `"relDiffAsymErrs"`).
    fn name(&self) -> &str;

    /// Compute the pull triple.
    fn compute(&self, inputs: &PullInputs) -> PullValue;

    /// Whether parameters without a prefit constraint keep a row under this definition.
    fn supports_unconstrained(&self) -> bool {
        false
    }
}
