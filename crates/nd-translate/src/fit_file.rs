//! Fit file: a JSON object mapping names to stored objects tagged by `"class"`.
//!
//! ```json
//! {
//!   "fit_s": { "class": "RooFitResult", "parameters": [...], "correlation": {...} },
//!   "fit_b": { "class": "RooFitResult", "parameters": [...], "correlation": {...} },
//!   "nuisances_prefit": { "class": "RooArgSet", "parameters": [...] }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use nd_core::{Error, FitSnapshot, PrefitSnapshot, Result, SnapshotSet};
use serde::de::DeserializeOwned;

/// Class tag of a fit result.
pub const FIT_RESULT_CLASS: &str = "RooFitResult";
/// Class tag of a parameter set.
pub const ARG_SET_CLASS: &str = "RooArgSet";

/// Key of the signal-plus-background fit.
pub const FIT_S_KEY: &str = "fit_s";
/// Key of the background-only fit.
pub const FIT_B_KEY: &str = "fit_b";
/// Key of the prefit snapshot.
pub const PREFIT_KEY: &str = "nuisances_prefit";

/// Parsed fit file; objects are decoded on access.
#[derive(Debug, Clone)]
pub struct FitFile {
    label: String,
    objects: BTreeMap<String, serde_json::Value>,
}

impl FitFile {
    /// Read and parse a fit file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading fit file");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&path.display().to_string(), &json)
    }

    /// Parse fit-file JSON; `label` names the source in error messages.
    pub fn from_json(label: &str, json: &str) -> Result<Self> {
        let objects: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        tracing::debug!(objects = objects.len(), "fit file parsed");
        Ok(Self { label: label.to_string(), objects })
    }

    /// Names of the stored objects.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    fn object<T: DeserializeOwned>(&self, key: &str, class: &str, what: &str) -> Result<T> {
        let value = self.objects.get(key).ok_or_else(|| Error::MissingObject {
            file: self.label.clone(),
            name: key.to_string(),
            what: what.to_string(),
        })?;
        let found = value.get("class").and_then(|c| c.as_str()).unwrap_or("<none>");
        if found != class {
            return Err(Error::WrongObjectKind {
                file: self.label.clone(),
                name: key.to_string(),
                expected: class.to_string(),
                found: found.to_string(),
            });
        }
        T::deserialize(value).map_err(|e| {
            Error::Validation(format!("{}: malformed {class} '{key}': {e}", self.label))
        })
    }

    /// Fit result stored under `key`.
    pub fn fit_result(&self, key: &str, what: &str) -> Result<FitSnapshot> {
        self.object(key, FIT_RESULT_CLASS, what)
    }

    /// Parameter set stored under `key`.
    pub fn arg_set(&self, key: &str, what: &str) -> Result<PrefitSnapshot> {
        self.object(key, ARG_SET_CLASS, what)
    }

    /// The three snapshots of a comparison.
    ///
    /// `skip_fit_s` uses the B-only fit for both sides, `skip_fit_b` the S+B
    /// fit. Every object that is read must exist and carry the right class.
    pub fn snapshots(&self, skip_fit_s: bool, skip_fit_b: bool) -> Result<SnapshotSet> {
        let fit_s_key = if skip_fit_s { FIT_B_KEY } else { FIT_S_KEY };
        let fit_b_key = if skip_fit_b { FIT_S_KEY } else { FIT_B_KEY };

        let fit_s = self.fit_result(fit_s_key, "output of the signal fit")?;
        let fit_b = self.fit_result(fit_b_key, "output of the background fit")?;
        let prefit = self.arg_set(PREFIT_KEY, "prefit nuisances")?;

        tracing::info!(
            fit_s = fit_s.parameters.len(),
            fit_b = fit_b.parameters.len(),
            prefit = prefit.parameters.len(),
            "snapshots loaded"
        );
        Ok(SnapshotSet { fit_b, fit_s, prefit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FILE: &str = r#"{
        "fit_s": {
            "class": "RooFitResult",
            "parameters": [
                {"name": "r", "value": 1.2, "error": 0.4},
                {"name": "lumi", "value": 0.3, "error_lo": -0.9, "error_hi": 1.0, "min": -4, "max": 4}
            ],
            "correlation": {"names": ["r", "lumi"], "matrix": [[1.0, -0.2], [-0.2, 1.0]]}
        },
        "fit_b": {
            "class": "RooFitResult",
            "parameters": [{"name": "lumi", "value": 0.1, "error": 0.95}]
        },
        "nuisances_prefit": {
            "class": "RooArgSet",
            "parameters": [{"name": "lumi", "value": 0.0, "error": 1.0, "min": -4, "max": 4}]
        },
        "histogram": {"class": "TH1F"}
    }"#;

    #[test]
    fn reads_all_three_snapshots() {
        let f = FitFile::from_json("fit.json", FILE).unwrap();
        let s = f.snapshots(false, false).unwrap();
        assert_eq!(s.fit_s.parameters.len(), 2);
        assert_abs_diff_eq!(s.fit_s.correlation("lumi", "r").unwrap(), -0.2);
        let lumi = s.fit_s.find("lumi").unwrap();
        assert_abs_diff_eq!(lumi.error_lo, 0.9);
        assert_eq!(lumi.domain(), Some((-4.0, 4.0)));
        assert!(s.prefit.find("r").is_none());
        assert_abs_diff_eq!(s.fit_b.find("lumi").unwrap().error, 0.95);
    }

    #[test]
    fn skip_fit_s_duplicates_background_fit() {
        let f = FitFile::from_json("fit.json", FILE).unwrap();
        let s = f.snapshots(true, false).unwrap();
        assert_eq!(s.fit_s.parameters.len(), 1);
        assert_eq!(s.fit_b.parameters.len(), 1);
    }

    #[test]
    fn missing_object_is_reported() {
        let f = FitFile::from_json("fit.json", r#"{"fit_b": {"class": "RooFitResult", "parameters": []}}"#)
            .unwrap();
        let err = f.snapshots(false, false).unwrap_err();
        assert!(matches!(err, Error::MissingObject { ref name, .. } if name == "fit_s"));
    }

    #[test]
    fn wrong_class_is_reported() {
        let f = FitFile::from_json("fit.json", FILE).unwrap();
        let err = f.fit_result("histogram", "a fit").unwrap_err();
        assert!(matches!(err, Error::WrongObjectKind { ref found, .. } if found == "TH1F"));
        let err = f.arg_set("fit_s", "prefit nuisances").unwrap_err();
        assert!(matches!(err, Error::WrongObjectKind { ref expected, .. } if expected == "RooArgSet"));
    }

    #[test]
    fn malformed_object_is_a_validation_error() {
        let f = FitFile::from_json("fit.json", r#"{"fit_s": {"class": "RooFitResult", "parameters": 3}}"#)
            .unwrap();
        assert!(matches!(f.fit_result("fit_s", "signal fit"), Err(Error::Validation(_))));
    }
}
