//! Snapshot data model: prefit, fit-B and fit-S parameter states.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Absolute tolerance under which low/high errors are considered equal.
pub const SYMMETRY_TOLERANCE: f64 = 0.01;

/// State of one parameter in one snapshot.
///
/// Errors are stored as magnitudes. Deserialization accepts a signed
/// `error_lo` (RooFit convention) and a lone symmetric `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParameter")]
pub struct ParameterSnapshot {
    /// Parameter name
    pub name: String,
    /// Central value
    pub value: f64,
    /// Symmetric error
    pub error: f64,
    /// Low-side error magnitude
    pub error_lo: f64,
    /// High-side error magnitude
    pub error_hi: f64,
    /// Lower domain bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper domain bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    value: f64,
    #[serde(default)]
    error: Option<f64>,
    #[serde(default)]
    error_lo: Option<f64>,
    #[serde(default)]
    error_hi: Option<f64>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl From<RawParameter> for ParameterSnapshot {
    fn from(raw: RawParameter) -> Self {
        let mut p = Self::asymmetric(
            raw.name,
            raw.value,
            raw.error_lo.unwrap_or(0.0),
            raw.error_hi.unwrap_or(0.0),
        );
        if p.error_lo == 0.0 && p.error_hi == 0.0 {
            let e = raw.error.unwrap_or(0.0).abs();
            p.error_lo = e;
            p.error_hi = e;
        }
        p.error = match raw.error {
            Some(e) if !p.is_symmetric() => e.abs(),
            _ => p.resolved_error(),
        };
        p.min = raw.min;
        p.max = raw.max;
        p
    }
}

impl ParameterSnapshot {
    /// Parameter with a single symmetric error.
    pub fn symmetric(name: impl Into<String>, value: f64, error: f64) -> Self {
        let e = error.abs();
        Self { name: name.into(), value, error: e, error_lo: e, error_hi: e, min: None, max: None }
    }

    /// Parameter with asymmetric errors; the sign of `error_lo` is ignored.
    pub fn asymmetric(name: impl Into<String>, value: f64, error_lo: f64, error_hi: f64) -> Self {
        let mut p = Self {
            name: name.into(),
            value,
            error: 0.0,
            error_lo: error_lo.abs(),
            error_hi: error_hi.abs(),
            min: None,
            max: None,
        };
        p.error = p.resolved_error();
        p
    }

    /// Set the domain bounds.
    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// `true` when low and high errors agree within [`SYMMETRY_TOLERANCE`],
    /// or when no low-side error was reported.
    pub fn is_symmetric(&self) -> bool {
        (self.error_lo - self.error_hi).abs() < SYMMETRY_TOLERANCE || self.error_lo == 0.0
    }

    /// Low-side error, falling back to the symmetric error when none was reported.
    pub fn effective_error_lo(&self) -> f64 {
        if self.error_lo > 0.0 { self.error_lo } else { self.error }
    }

    /// Finite, non-degenerate domain bounds.
    pub fn domain(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() && hi > lo => Some((lo, hi)),
            _ => None,
        }
    }

    fn resolved_error(&self) -> f64 {
        if self.is_symmetric() { self.error_hi } else { 0.5 * (self.error_lo + self.error_hi) }
    }
}

/// Correlation matrix of a fit, addressed by parameter name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCorrelation")]
pub struct CorrelationMatrix {
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct RawCorrelation {
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

impl TryFrom<RawCorrelation> for CorrelationMatrix {
    type Error = Error;

    fn try_from(raw: RawCorrelation) -> Result<Self> {
        Self::new(raw.names, raw.matrix)
    }
}

impl CorrelationMatrix {
    /// Build from names and a square row-major matrix.
    pub fn new(names: Vec<String>, matrix: Vec<Vec<f64>>) -> Result<Self> {
        let n = names.len();
        if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
            return Err(Error::Validation(format!(
                "correlation matrix must be {n}x{n} to match its parameter names"
            )));
        }
        let index = names.iter().enumerate().map(|(i, name)| (name.clone(), i)).collect();
        Ok(Self { names, matrix, index })
    }

    /// Identity matrix over `names` with the given symmetric off-diagonal entries.
    pub fn from_pairs(names: &[&str], pairs: &[(&str, &str, f64)]) -> Result<Self> {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let n = names.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        let mut out = Self::new(names, matrix)?;
        for &(a, b, rho) in pairs {
            let (i, j) = match (out.index.get(a), out.index.get(b)) {
                (Some(&i), Some(&j)) => (i, j),
                _ => {
                    return Err(Error::Validation(format!(
                        "correlation pair ({a}, {b}) references unknown parameter"
                    )));
                }
            };
            out.matrix[i][j] = rho;
            out.matrix[j][i] = rho;
        }
        Ok(out)
    }

    /// Correlation coefficient between two named parameters.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.matrix[i][j])
    }

    /// Parameter names in matrix order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Result of a postfit (fit-B or fit-S) minimization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitSnapshot {
    /// Final floated parameters, in fit order.
    pub parameters: Vec<ParameterSnapshot>,
    /// Correlation matrix of the floated parameters.
    #[serde(default)]
    pub correlation: CorrelationMatrix,
}

impl FitSnapshot {
    /// Create a fit snapshot
    pub fn new(parameters: Vec<ParameterSnapshot>, correlation: CorrelationMatrix) -> Self {
        Self { parameters, correlation }
    }

    /// Look up a floated parameter by name.
    pub fn find(&self, name: &str) -> Option<&ParameterSnapshot> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Correlation coefficient between two parameters of this fit.
    pub fn correlation(&self, name: &str, other: &str) -> Option<f64> {
        self.correlation.get(name, other)
    }
}

/// Parameter values and uncertainties before the fit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefitSnapshot {
    /// Constrained parameters.
    pub parameters: Vec<ParameterSnapshot>,
}

impl PrefitSnapshot {
    /// Create a prefit snapshot
    pub fn new(parameters: Vec<ParameterSnapshot>) -> Self {
        Self { parameters }
    }

    /// Look up a parameter; `None` for unconstrained or absent parameters.
    pub fn find(&self, name: &str) -> Option<&ParameterSnapshot> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// The three snapshots a comparison consumes.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    /// Background-only fit
    pub fit_b: FitSnapshot,
    /// Signal-plus-background fit
    pub fit_s: FitSnapshot,
    /// Prefit constraints
    pub prefit: PrefitSnapshot,
}

impl SnapshotSet {
    /// Floated parameter names: fit-S order first, then fit-B-only parameters.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fit_s.parameters.iter().map(|p| p.name.as_str()).collect();
        for p in &self.fit_b.parameters {
            if self.fit_s.find(&p.name).is_none() {
                names.push(p.name.as_str());
            }
        }
        names
    }
}
