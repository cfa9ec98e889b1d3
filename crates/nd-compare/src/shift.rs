use nd_core::ParameterSnapshot;
use nd_pulls::{PullDefinition, PullInputs, PullValue};
use serde::Serialize;

use crate::config::ToleranceConfig;

/// Deviation severity of one fit side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Within tolerances
    #[default]
    None,
    /// Beyond the report tolerances
    Moderate,
    /// Beyond the severe tolerances
    Severe,
}

/// Prefit-relative displacement of one fit side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shift {
    /// `(x - mu) / sigma_pre`, the pull, or the absolute shift when no prefit width exists.
    pub value_shift: f64,
    /// `sigma_post / sigma_pre`; `1` in pull mode; absolute `sigma_post` when no prefit width exists.
    pub sigma_ratio: f64,
    /// `false` when the prefit width was not positive and absolute shifts were used.
    pub normalized: bool,
    /// Flag level
    pub severity: Severity,
}

/// Evaluation of one parameter in one postfit snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SideResult {
    /// Postfit state
    pub postfit: ParameterSnapshot,
    /// Displayed `(value, err_lo, err_hi)`: raw postfit values, or the pull triple.
    pub display: PullValue,
    /// `None` when the parameter has no prefit constraint.
    pub shift: Option<Shift>,
}

impl SideResult {
    /// Severity of this side (`None` without a shift).
    pub fn severity(&self) -> Severity {
        self.shift.map_or(Severity::None, |s| s.severity)
    }
}

/// Prefit width: the reported error if positive, otherwise half the domain.
///
/// Returns `0.0` when neither is available.
pub fn prefit_sigma(prefit: &ParameterSnapshot) -> f64 {
    if prefit.error > 0.0 {
        return prefit.error;
    }
    prefit.domain().map_or(0.0, |(lo, hi)| 0.5 * (hi - lo))
}

/// Classify a shift. Comparisons are strict: a value on a threshold does not cross it.
pub fn classify(value_shift: f64, sigma_ratio: f64, tol: &ToleranceConfig) -> Severity {
    let v = value_shift.abs();
    let s = (sigma_ratio - 1.0).abs();
    if v > tol.value_severe || s > tol.sigma_severe {
        Severity::Severe
    } else if v > tol.value || s > tol.sigma {
        Severity::Moderate
    } else {
        Severity::None
    }
}

/// Evaluate one postfit parameter against its prefit state.
pub fn evaluate(
    postfit: &ParameterSnapshot,
    prefit: Option<&ParameterSnapshot>,
    pull: Option<&dyn PullDefinition>,
    tol: &ToleranceConfig,
) -> SideResult {
    let err_lo = postfit.effective_error_lo();
    let raw = PullValue::new(postfit.value, err_lo, postfit.error_hi);

    let Some(pre) = prefit else {
        return SideResult { postfit: postfit.clone(), display: raw, shift: None };
    };

    let display = match pull {
        Some(def) => def.compute(&PullInputs {
            value: postfit.value,
            mean: pre.value,
            err_hi: postfit.error_hi,
            prefit_err_hi: pre.error_hi,
            err_lo,
            prefit_err_lo: pre.effective_error_lo(),
        }),
        None => raw,
    };

    // A missing prefit width falls back to absolute shifts, also under a pull definition.
    let sigma = prefit_sigma(pre);
    let (value_shift, sigma_ratio, normalized) = if sigma <= 0.0 {
        tracing::debug!(name = %pre.name, "no prefit uncertainty, reporting absolute shifts");
        (postfit.value - pre.value, postfit.error, false)
    } else if pull.is_some() {
        (display.pull, 1.0, true)
    } else {
        ((postfit.value - pre.value) / sigma, postfit.error / sigma, true)
    };

    let severity = classify(value_shift, sigma_ratio, tol);
    SideResult {
        postfit: postfit.clone(),
        display,
        shift: Some(Shift { value_shift, sigma_ratio, normalized, severity }),
    }
}
