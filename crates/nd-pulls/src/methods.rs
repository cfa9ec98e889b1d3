//! Built-in pull definitions.

use crate::definition::{PullDefinition, PullInputs, PullValue};

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Shift relative to the prefit error on the side the value moved to.
///
/// `pull = (x - mu) / sigma_pre(side)`; errors are the postfit-to-prefit
/// error ratios on each side.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelDiffAsymErrs;

impl PullDefinition for RelDiffAsymErrs {
    fn name(&self) -> &str {
        "relDiffAsymErrs"
    }

    fn compute(&self, p: &PullInputs) -> PullValue {
        let prefit = if p.above_mean() { p.prefit_err_hi } else { p.prefit_err_lo };
        if prefit <= 0.0 {
            tracing::debug!(value = p.value, mean = p.mean, "relDiffAsymErrs: non-positive prefit error");
            return PullValue::undefined();
        }
        PullValue::new(
            p.delta() / prefit,
            ratio_or_zero(p.err_lo, p.prefit_err_lo),
            ratio_or_zero(p.err_hi, p.prefit_err_hi),
        )
    }
}

/// Shift in units of the postfit error facing the prefit mean.
///
/// Needs no prefit width, so unconstrained parameters keep their rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconstPullAsym;

impl PullDefinition for UnconstPullAsym {
    fn name(&self) -> &str {
        "unconstPullAsym"
    }

    fn compute(&self, p: &PullInputs) -> PullValue {
        let err = if p.above_mean() { p.err_lo } else { p.err_hi };
        if err <= 0.0 {
            tracing::debug!(value = p.value, mean = p.mean, "unconstPullAsym: non-positive postfit error");
            return PullValue::undefined();
        }
        PullValue::unit(p.delta() / err)
    }

    fn supports_unconstrained(&self) -> bool {
        true
    }
}

/// Difference pull: shift over `sqrt(sigma_pre^2 - sigma_post^2)`.
///
/// Uses the errors on the side facing the prefit mean. Undefined when the
/// postfit error is not smaller than the prefit one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffPullAsym;

impl PullDefinition for DiffPullAsym {
    fn name(&self) -> &str {
        "diffPullAsym"
    }

    fn compute(&self, p: &PullInputs) -> PullValue {
        let (post, pre) =
            if p.above_mean() { (p.err_lo, p.prefit_err_lo) } else { (p.err_hi, p.prefit_err_hi) };
        let var = pre * pre - post * post;
        if var <= 0.0 {
            tracing::debug!(post, pre, "diffPullAsym: postfit error not smaller than prefit");
            return PullValue::undefined();
        }
        PullValue::unit(p.delta() / var.sqrt())
    }
}
