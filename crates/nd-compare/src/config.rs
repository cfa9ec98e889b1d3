use std::fmt;
use std::str::FromStr;

use nd_core::{Error, Result};
use nd_pulls::{PullDefinition, PullRegistry};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Value and sigma tolerances for the MODERATE and SEVERE flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Report shifts larger than this many prefit sigmas.
    pub value: f64,
    /// Report relative sigma changes larger than this.
    pub sigma: f64,
    /// Severe threshold on the shift.
    pub value_severe: f64,
    /// Severe threshold on the sigma change.
    pub sigma_severe: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { value: 0.30, sigma: 0.10, value_severe: 2.0, sigma_severe: 0.50 }
    }
}

/// Row ordering criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// `|rho(theta, POI)|`, largest first.
    #[default]
    Correlation,
    /// `|impact|`, largest first.
    Impact,
    /// Likelihood difference, largest first. Needs a workspace.
    Dnll,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "correlation" => Ok(Self::Correlation),
            "impact" => Ok(Self::Impact),
            "dnll" => Ok(Self::Dnll),
            other => Err(Error::UnknownSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Correlation => "correlation",
            Self::Impact => "impact",
            Self::Dnll => "dnll",
        })
    }
}

/// User-facing comparison options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Flag thresholds
    pub tolerances: ToleranceConfig,
    /// Keep rows that are not flagged.
    pub show_all: bool,
    /// Also report absolute values, not only prefit-normalized shifts.
    pub absolute_values: bool,
    /// Name of the parameter of interest.
    pub poi: String,
    /// Pull definition name; `None` reports raw normalized shifts.
    pub pull_definition: Option<String>,
    /// Regular expression a name must match in full.
    pub name_filter: String,
    /// Row ordering
    pub sort_by: SortKey,
    /// Maximum parameters per plot page.
    pub max_nuis: usize,
    /// Use the B-only fit in place of the S+B fit.
    pub skip_fit_s: bool,
    /// Use the S+B fit in place of the B-only fit.
    pub skip_fit_b: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tolerances: ToleranceConfig::default(),
            show_all: false,
            absolute_values: false,
            poi: "r".to_string(),
            pull_definition: None,
            name_filter: ".*".to_string(),
            sort_by: SortKey::default(),
            max_nuis: 65,
            skip_fit_s: false,
            skip_fit_b: false,
        }
    }
}

impl CompareConfig {
    /// Check the options and resolve their interplay.
    ///
    /// Fails on an unknown pull definition, a `dnll` ordering without a
    /// workspace, an invalid name filter, or conflicting fit substitutions.
    /// A pull definition turns absolute values off and show-all on.
    pub fn resolve<'r>(
        mut self,
        registry: &'r PullRegistry,
        has_workspace: bool,
    ) -> Result<ComparePlan<'r>> {
        if self.pull_definition.as_deref() == Some("") {
            self.pull_definition = None;
        }
        let pull = match self.pull_definition.as_deref() {
            Some(name) => Some(registry.lookup(name)?),
            None => None,
        };

        if let Some(p) = pull {
            if self.absolute_values {
                tracing::info!(
                    pull_definition = p.name(),
                    "pulls are always reported normalized, turning absolute values off"
                );
                self.absolute_values = false;
            }
            if !self.show_all {
                tracing::info!(pull_definition = p.name(), "pull definition selected, showing all parameters");
                self.show_all = true;
            }
        }

        if self.sort_by == SortKey::Dnll && !has_workspace {
            return Err(Error::Config(
                "can only sort by dnll if a workspace is provided, otherwise no dnll can be calculated"
                    .to_string(),
            ));
        }
        if self.skip_fit_s && self.skip_fit_b {
            return Err(Error::Config("skip_fit_s and skip_fit_b are mutually exclusive".to_string()));
        }
        if self.max_nuis == 0 {
            return Err(Error::Config("max_nuis must be >= 1".to_string()));
        }

        let filter = Regex::new(&format!("^(?:{})$", self.name_filter))
            .map_err(|e| Error::Validation(format!("invalid name filter '{}': {e}", self.name_filter)))?;
        if self.name_filter != ".*" {
            tracing::info!(regex = %self.name_filter, "including only nuisance parameters matching");
        }

        Ok(ComparePlan { config: self, filter, pull })
    }
}

/// Validated options ready for table building.
pub struct ComparePlan<'r> {
    config: CompareConfig,
    filter: Regex,
    pull: Option<&'r dyn PullDefinition>,
}

impl<'r> ComparePlan<'r> {
    /// Effective options (after resolution).
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Active pull definition.
    pub fn pull(&self) -> Option<&'r dyn PullDefinition> {
        self.pull
    }

    /// Full-match test against the name filter.
    pub fn accepts(&self, name: &str) -> bool {
        self.filter.is_match(name)
    }

    /// Whether parameters absent from prefit keep a row.
    pub fn keeps_unconstrained(&self) -> bool {
        self.config.absolute_values || self.pull.is_some_and(|p| p.supports_unconstrained())
    }
}

impl fmt::Debug for ComparePlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparePlan")
            .field("config", &self.config)
            .field("filter", &self.filter.as_str())
            .field("pull", &self.pull.map(|p| p.name()))
            .finish()
    }
}
