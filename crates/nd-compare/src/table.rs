use std::collections::BTreeMap;

use nd_core::{LikelihoodWorkspace, ParameterSnapshot, Result, SnapshotSet};

use crate::config::ComparePlan;
use crate::impact;
use crate::shift::{self, Severity, SideResult};

/// Postfit side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Background-only fit
    B,
    /// Signal-plus-background fit
    S,
}

impl Side {
    /// Both sides in display order.
    pub const ALL: [Side; 2] = [Side::B, Side::S];
}

/// One parameter of the final table. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Parameter name
    pub name: String,
    /// Prefit state; `None` for unconstrained parameters.
    pub prefit: Option<ParameterSnapshot>,
    /// Background-only side; `None` if the fit did not float this parameter.
    pub fit_b: Option<SideResult>,
    /// Signal-plus-background side; `None` if the fit did not float this parameter.
    pub fit_s: Option<SideResult>,
    /// Correlation with the POI in the S+B fit.
    pub correlation: f64,
    /// Approximate impact on the POI.
    pub impact: f64,
    /// Constraint likelihood difference, when a workspace was supplied.
    pub dnll: Option<f64>,
}

impl ComparisonRow {
    /// Result for one side.
    pub fn side(&self, side: Side) -> Option<&SideResult> {
        match side {
            Side::B => self.fit_b.as_ref(),
            Side::S => self.fit_s.as_ref(),
        }
    }

    /// Severity of one side (`None` for a missing side).
    pub fn severity(&self, side: Side) -> Severity {
        self.side(side).map_or(Severity::None, SideResult::severity)
    }

    /// Worst severity over both sides.
    pub fn max_severity(&self) -> Severity {
        self.severity(Side::B).max(self.severity(Side::S))
    }

    /// `true` for parameters without a prefit constraint.
    pub fn is_unconstrained(&self) -> bool {
        self.prefit.is_none()
    }

    /// Postfit domain used in place of a prefit value for unconstrained parameters.
    pub fn postfit_domain(&self) -> (Option<f64>, Option<f64>) {
        let p = self.fit_s.as_ref().or(self.fit_b.as_ref()).map(|s| &s.postfit);
        (p.and_then(|p| p.min), p.and_then(|p| p.max))
    }
}

/// Rows keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct ComparisonTable {
    rows: BTreeMap<String, ComparisonRow>,
    /// Constrained rows that were evaluated but not retained.
    dropped: Vec<ComparisonRow>,
    poi_error: f64,
    has_dnll: bool,
}

impl ComparisonTable {
    /// Rows in name order.
    pub fn rows(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.values()
    }

    /// Row by name.
    pub fn get(&self, name: &str) -> Option<&ComparisonRow> {
        self.rows.get(name)
    }

    /// Every evaluated constrained row, retained or not.
    ///
    /// Plot data is built from these so that unflagged parameters still count.
    pub fn evaluated(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.values().filter(|r| !r.is_unconstrained()).chain(self.dropped.iter())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when no row survived
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// POI postfit error used for impacts.
    pub fn poi_error(&self) -> f64 {
        self.poi_error
    }

    /// Whether a dnll column was computed.
    pub fn has_dnll(&self) -> bool {
        self.has_dnll
    }

    fn insert(&mut self, row: ComparisonRow) {
        self.rows.insert(row.name.clone(), row);
    }
}

/// Builds a [`ComparisonTable`] from snapshots and a validated plan.
pub struct TableBuilder<'a, 'r> {
    plan: &'a ComparePlan<'r>,
    snapshots: &'a SnapshotSet,
    workspace: Option<&'a mut dyn LikelihoodWorkspace>,
}

impl<'a, 'r> TableBuilder<'a, 'r> {
    /// Create a builder
    pub fn new(plan: &'a ComparePlan<'r>, snapshots: &'a SnapshotSet) -> Self {
        Self { plan, snapshots, workspace: None }
    }

    /// Attach a likelihood workspace to compute dnll.
    pub fn with_workspace(mut self, ws: &'a mut dyn LikelihoodWorkspace) -> Self {
        self.workspace = Some(ws);
        self
    }

    /// Evaluate every floated parameter and keep the retained rows.
    ///
    /// Filter: name pattern, then prefit presence, then flag / show-all.
    pub fn build(mut self) -> Result<ComparisonTable> {
        let cfg = self.plan.config();
        let snaps = self.snapshots;
        let poi_error = impact::poi_error(&snaps.fit_s, &cfg.poi)?;
        let keep_unconstrained = self.plan.keeps_unconstrained();

        if let Some(ws) = self.workspace.as_deref() {
            tracing::info!(workspace = ws.name(), "computing constraint dnll");
        }

        let mut table = ComparisonTable {
            rows: BTreeMap::new(),
            dropped: Vec::new(),
            poi_error,
            has_dnll: self.workspace.is_some(),
        };
        let mut skipped_unconstrained = 0usize;

        for name in snaps.parameter_names() {
            if !self.plan.accepts(name) {
                continue;
            }
            let prefit = snaps.prefit.find(name);
            if prefit.is_none() && !keep_unconstrained {
                skipped_unconstrained += 1;
                continue;
            }

            let evaluate = |p: &ParameterSnapshot| {
                shift::evaluate(p, prefit, self.plan.pull(), &cfg.tolerances)
            };
            let fit_b = snaps.fit_b.find(name).map(evaluate);
            let fit_s = snaps.fit_s.find(name).map(evaluate);

            let correlation = snaps.fit_s.correlation(name, &cfg.poi).unwrap_or_else(|| {
                tracing::debug!(name, poi = %cfg.poi, "no correlation entry, using 0");
                0.0
            });
            let postfit_error =
                fit_s.as_ref().or(fit_b.as_ref()).map_or(0.0, |s| s.postfit.error);
            let impact = impact::approx_impact(postfit_error, correlation, poi_error);

            let dnll = match (self.workspace.as_deref_mut(), &fit_b, &fit_s, prefit) {
                (Some(ws), Some(b), Some(s), Some(_)) => {
                    Some(impact::dnll(ws, name, b.postfit.value, s.postfit.value)?)
                }
                _ => None,
            };

            let row = ComparisonRow {
                name: name.to_string(),
                prefit: prefit.cloned(),
                fit_b,
                fit_s,
                correlation,
                impact,
                dnll,
            };

            if row.is_unconstrained() || row.max_severity() > Severity::None || cfg.show_all {
                table.insert(row);
            } else {
                table.dropped.push(row);
            }
        }

        tracing::info!(
            rows = table.len(),
            dropped = table.dropped.len(),
            skipped_unconstrained,
            poi = %cfg.poi,
            poi_error,
            "comparison table built"
        );
        Ok(table)
    }
}
