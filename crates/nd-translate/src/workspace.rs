//! JSON likelihood workspace: floating variables plus one constraint pdf per nuisance.
//!
//! ```json
//! {
//!   "name": "w",
//!   "variables": { "lumi": { "value": 0.0, "min": -4, "max": 4 } },
//!   "pdfs": { "lumi_Pdf": { "kind": "gaussian", "x": "lumi", "mean": 0.0, "sigma": 1.0 } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use nd_core::{Error, LikelihoodWorkspace, Result};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

/// Natural log of `sqrt(2π)`.
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Floating variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceVariable {
    /// Current value
    pub value: f64,
    /// Lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Constraint term over a single variable `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConstraintPdf {
    /// `N(x | mean, sigma)`
    Gaussian {
        /// Observable variable
        x: String,
        /// Mean
        mean: f64,
        /// Width
        sigma: f64,
    },
    /// `Pois(observed | scale * x)`, normalized over the observed count.
    Poisson {
        /// Rate variable
        x: String,
        /// Observed auxiliary count
        observed: f64,
        /// Rate per unit of `x`
        #[serde(default = "default_scale")]
        scale: f64,
    },
    /// Flat over the variable's bounds.
    Uniform {
        /// Observable variable
        x: String,
    },
}

fn default_scale() -> f64 {
    1.0
}

impl ConstraintPdf {
    /// Variable the pdf is defined over.
    pub fn observable(&self) -> &str {
        match self {
            Self::Gaussian { x, .. } | Self::Poisson { x, .. } | Self::Uniform { x } => x,
        }
    }

    fn nll(&self, var: &WorkspaceVariable) -> Result<f64> {
        let x = var.value;
        match self {
            Self::Gaussian { mean, sigma, .. } => {
                if !sigma.is_finite() || *sigma <= 0.0 {
                    return Err(Error::Validation(format!("sigma must be finite and > 0, got {sigma}")));
                }
                let z = (x - mean) / sigma;
                Ok(0.5 * z * z + sigma.ln() + LN_SQRT_2PI)
            }
            Self::Poisson { observed, scale, .. } => {
                let lambda = scale * x;
                if !lambda.is_finite() || lambda < 0.0 || *observed < 0.0 {
                    return Err(Error::Validation(format!(
                        "poisson requires rate >= 0 and observed >= 0, got rate={lambda} observed={observed}"
                    )));
                }
                if lambda == 0.0 {
                    return Ok(if *observed == 0.0 { 0.0 } else { f64::INFINITY });
                }
                Ok(lambda - observed * lambda.ln() + ln_gamma(observed + 1.0))
            }
            Self::Uniform { .. } => match (var.min, var.max) {
                (Some(lo), Some(hi)) if hi > lo => {
                    if (lo..=hi).contains(&x) { Ok((hi - lo).ln()) } else { Ok(f64::INFINITY) }
                }
                _ => Err(Error::Validation("uniform constraint requires finite variable bounds".to_string())),
            },
        }
    }
}

/// Likelihood workspace read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonWorkspace {
    /// Workspace name
    #[serde(default = "default_name")]
    pub name: String,
    /// Floating variables by name
    #[serde(default)]
    pub variables: BTreeMap<String, WorkspaceVariable>,
    /// Constraint pdfs by name
    #[serde(default)]
    pub pdfs: BTreeMap<String, ConstraintPdf>,
}

fn default_name() -> String {
    "w".to_string()
}

impl JsonWorkspace {
    /// Read a workspace from disk.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading workspace");
        let json = std::fs::read_to_string(path)?;
        let ws: Self = serde_json::from_str(&json)?;
        tracing::info!(variables = ws.variables.len(), pdfs = ws.pdfs.len(), "workspace loaded");
        Ok(ws)
    }

    fn variable(&self, var: &str) -> Result<&WorkspaceVariable> {
        self.variables
            .get(var)
            .ok_or_else(|| Error::MissingWorkspaceObject { kind: "variable", name: var.to_string() })
    }
}

impl LikelihoodWorkspace for JsonWorkspace {
    fn value(&self, var: &str) -> Result<f64> {
        Ok(self.variable(var)?.value)
    }

    fn set_value(&mut self, var: &str, value: f64) -> Result<()> {
        let v = self
            .variables
            .get_mut(var)
            .ok_or_else(|| Error::MissingWorkspaceObject { kind: "variable", name: var.to_string() })?;
        v.value = value;
        Ok(())
    }

    fn nll(&self, pdf: &str, var: &str) -> Result<f64> {
        let term = self
            .pdfs
            .get(pdf)
            .ok_or_else(|| Error::MissingWorkspaceObject { kind: "pdf", name: pdf.to_string() })?;
        if term.observable() != var {
            return Err(Error::Validation(format!(
                "pdf '{pdf}' is defined over '{}', not '{var}'",
                term.observable()
            )));
        }
        term.nll(self.variable(var)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
