//! Plot-friendly artifact of a comparison (numbers-first).

use std::time::{SystemTime, UNIX_EPOCH};

use nd_compare::shift::prefit_sigma;
use nd_compare::{ComparisonRow, SideResult};
use nd_core::{Error, Result};
use serde::Serialize;

/// Number of bins of the shift histogram.
pub const SHIFT_BINS: usize = 60;
/// Range of the shift histogram.
pub const SHIFT_RANGE: (f64, f64) = (-3.0, 3.0);

/// Plot data of one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct NuisanceArtifact {
    /// Artifact schema identifier
    pub schema_version: String,
    /// Provenance
    pub meta: ArtifactMeta,
    /// `pull` under a pull definition, `theta` otherwise.
    pub title: String,
    /// Page size used to split the entries.
    pub max_nuis: usize,
    /// Plot pages in report order.
    pub pages: Vec<PullPage>,
    /// Distribution of background-only shifts
    pub shift_histogram: ShiftHistogram,
    /// Ranking by dnll; present only when a workspace was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnll: Option<Vec<DnllEntry>>,
}

/// Provenance of an artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    /// Producing tool
    pub tool: String,
    /// Tool version
    pub tool_version: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_unix_ms: u128,
    /// How entries are ordered across pages.
    pub ordering_policy: String,
}

/// One plot page.
#[derive(Debug, Clone, Serialize)]
pub struct PullPage {
    /// Zero-based page number
    pub index: usize,
    /// At most `max_nuis` parameters
    pub entries: Vec<PullPoint>,
}

/// Prefit band and postfit points of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct PullPoint {
    /// Parameter name
    pub name: String,
    /// Prefit value
    pub prefit_center: f64,
    /// Prefit width, see [`prefit_sigma`].
    pub prefit_sigma: f64,
    /// Background-only point, if that fit floated the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_b: Option<SidePoint>,
    /// Signal-plus-background point, if that fit floated the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_s: Option<SidePoint>,
}

/// Displayed point of one fit side.
#[derive(Debug, Clone, Serialize)]
pub struct SidePoint {
    /// Central value (postfit value or pull).
    pub value: f64,
    /// Low-side error, non-negative.
    pub err_lo: f64,
    /// High-side error
    pub err_hi: f64,
    /// Postfit over prefit width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma_ratio: Option<f64>,
}

/// Fixed-range histogram of B-only shifts.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftHistogram {
    /// Lower edge
    pub lo: f64,
    /// Upper edge
    pub hi: f64,
    /// Per-bin counts, [`SHIFT_BINS`] entries.
    pub counts: Vec<u64>,
    /// Entries below `lo`
    pub underflow: u64,
    /// Entries at or above `hi`
    pub overflow: u64,
}

/// Likelihood-difference ranking entry.
#[derive(Debug, Clone, Serialize)]
pub struct DnllEntry {
    /// Parameter name
    pub name: String,
    /// Page of this entry in the ranking.
    pub page: usize,
    /// Constraint likelihood difference
    pub dnll: f64,
    /// Running sum up to and including this entry.
    pub cumulative: f64,
}

/// Milliseconds since the Unix epoch.
pub fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

impl ShiftHistogram {
    fn new() -> Self {
        Self { lo: SHIFT_RANGE.0, hi: SHIFT_RANGE.1, counts: vec![0; SHIFT_BINS], underflow: 0, overflow: 0 }
    }

    /// Bins are half-open `[lo, hi)`.
    fn fill(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        if x < self.lo {
            self.underflow += 1;
            return;
        }
        let width = (self.hi - self.lo) / SHIFT_BINS as f64;
        let bin = ((x - self.lo) / width).floor() as usize;
        match self.counts.get_mut(bin) {
            Some(c) => *c += 1,
            None => self.overflow += 1,
        }
    }
}

fn side_point(side: &SideResult) -> SidePoint {
    SidePoint {
        value: side.display.pull,
        err_lo: side.display.err_lo,
        err_hi: side.display.err_hi,
        sigma_ratio: side.shift.map(|s| s.sigma_ratio),
    }
}

/// Build the artifact from rows in their final order.
///
/// `rows` should be every evaluated parameter (see
/// [`nd_compare::sort_evaluated`]), not only the ones kept in the report.
///
/// Policy:
/// - Pages hold at most `max_nuis` constrained parameters; rows without a
///   prefit constraint have nothing to plot and are skipped.
/// - The histogram collects the background-only shifts.
/// - With `with_dnll`, rows carrying a dnll are ranked by it, largest first,
///   alongside the running sum.
pub fn nuisance_artifact(
    rows: &[&ComparisonRow],
    pull_mode: bool,
    max_nuis: usize,
    with_dnll: bool,
) -> Result<NuisanceArtifact> {
    if max_nuis == 0 {
        return Err(Error::Validation("max_nuis must be >= 1".to_string()));
    }

    let mut histogram = ShiftHistogram::new();
    let mut points = Vec::new();
    for row in rows {
        let Some(prefit) = &row.prefit else {
            continue;
        };
        if let Some(shift) = row.fit_b.as_ref().and_then(|b| b.shift) {
            histogram.fill(shift.value_shift);
        }
        points.push(PullPoint {
            name: row.name.clone(),
            prefit_center: prefit.value,
            prefit_sigma: prefit_sigma(prefit),
            fit_b: row.fit_b.as_ref().map(side_point),
            fit_s: row.fit_s.as_ref().map(side_point),
        });
    }

    let mut pages: Vec<PullPage> = Vec::new();
    for (index, chunk) in points.chunks(max_nuis).enumerate() {
        pages.push(PullPage { index, entries: chunk.to_vec() });
    }

    let dnll = with_dnll.then(|| {
        let mut ranked: Vec<(&str, f64)> =
            rows.iter().filter_map(|r| r.dnll.map(|d| (r.name.as_str(), d))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut cumulative = 0.0;
        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (name, dnll))| {
                cumulative += dnll;
                DnllEntry { name: name.to_string(), page: i / max_nuis, dnll, cumulative }
            })
            .collect()
    });

    tracing::info!(pages = pages.len(), entries = points.len(), "plot artifact assembled");

    Ok(NuisanceArtifact {
        schema_version: "nuisdiff_pulls_v0".to_string(),
        meta: ArtifactMeta {
            tool: "diffnuisances".to_string(),
            tool_version: nd_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
            ordering_policy: "report_order".to_string(),
        },
        title: if pull_mode { "pull" } else { "theta" }.to_string(),
        max_nuis,
        pages,
        shift_histogram: histogram,
        dnll,
    })
}
