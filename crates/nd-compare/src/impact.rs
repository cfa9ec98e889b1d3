use nd_core::{Error, FitSnapshot, LikelihoodWorkspace, Result};

/// Postfit error of the POI in the signal-plus-background fit.
pub fn poi_error(fit_s: &FitSnapshot, poi: &str) -> Result<f64> {
    fit_s.find(poi).map(|p| p.error).ok_or_else(|| {
        Error::Validation(format!("POI '{poi}' is not among the floated parameters of the S+B fit"))
    })
}

/// Linear impact estimate `sigma_post * rho(theta, POI) * sigma_POI`.
pub fn approx_impact(postfit_error: f64, correlation: f64, poi_error: f64) -> f64 {
    postfit_error * correlation * poi_error
}

/// Temporarily overrides a workspace variable; the previous value is restored on drop.
///
/// Holds the only mutable borrow of the workspace, so overrides cannot overlap.
pub struct ValueOverride<'a, W: LikelihoodWorkspace + ?Sized> {
    ws: &'a mut W,
    var: String,
    original: f64,
}

impl<'a, W: LikelihoodWorkspace + ?Sized> ValueOverride<'a, W> {
    /// Set `var` to `value`, remembering its current value.
    pub fn new(ws: &'a mut W, var: &str, value: f64) -> Result<Self> {
        let original = ws.value(var)?;
        ws.set_value(var, value)?;
        Ok(Self { ws, var: var.to_string(), original })
    }

    /// Read access to the workspace while the override is in place.
    pub fn workspace(&self) -> &W {
        &*self.ws
    }
}

impl<W: LikelihoodWorkspace + ?Sized> Drop for ValueOverride<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.ws.set_value(&self.var, self.original) {
            tracing::error!(var = %self.var, error = %e, "failed to restore workspace variable");
        }
    }
}

/// `-log p` of `pdf` with `var` held at `value`.
pub fn nll_at<W: LikelihoodWorkspace + ?Sized>(ws: &mut W, pdf: &str, var: &str, value: f64) -> Result<f64> {
    let guard = ValueOverride::new(ws, var, value)?;
    guard.workspace().nll(pdf, var)
}

/// Constraint-term likelihood difference `nll(theta_B) - nll(theta_S)` for nuisance `name`.
///
/// Evaluates the pdf `<name>_Pdf` over the variable `<name>`.
pub fn dnll<W: LikelihoodWorkspace + ?Sized>(ws: &mut W, name: &str, value_b: f64, value_s: f64) -> Result<f64> {
    let pdf = format!("{name}_Pdf");
    let nll_b = nll_at(ws, &pdf, name, value_b)?;
    let nll_s = nll_at(ws, &pdf, name, value_s)?;
    tracing::debug!(name, nll_b, nll_s, "constraint nll");
    Ok(nll_b - nll_s)
}
