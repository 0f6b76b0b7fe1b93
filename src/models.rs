//! Data structures shared by the matchers and the line scanner.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Default cost of every edit operation.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Broad class of a [`MatchError`].
///
/// The engine's algorithms are total over well-formed strings, so the only
/// way a call can fail is being handed a value of the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("value of weight {kind} has to be a finite non-negative number ({value} given)")]
    InvalidWeight { kind: WeightKind, value: f64 },
    #[error("value of weight {kind} has to be a number ({found} given)")]
    WeightNotNumeric { kind: WeightKind, found: &'static str },
    #[error("pattern has to be a string ({found} given)")]
    PatternNotString { found: &'static str },
    #[error("argument #{position} has to be a string ({found} given)")]
    TargetNotString { position: usize, found: &'static str },
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Type
    }
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One of the three edit operations carrying a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightKind {
    Substitution,
    Insertion,
    Deletion,
}

impl WeightKind {
    pub const ALL: [WeightKind; 3] = [
        WeightKind::Substitution,
        WeightKind::Insertion,
        WeightKind::Deletion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeightKind::Substitution => "substitution",
            WeightKind::Insertion => "insertion",
            WeightKind::Deletion => "deletion",
        }
    }
}

impl fmt::Display for WeightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Edit operation costs used by the Levenshtein and Sellers matchers.
///
/// Every stored value is finite and non-negative. A rejected assignment
/// leaves the previous value in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct WeightSet {
    substitution: f64,
    insertion: f64,
    deletion: f64,
}

/// Unvalidated mirror of [`WeightSet`] used while deserializing.
#[derive(Deserialize)]
#[serde(default)]
struct RawWeights {
    substitution: f64,
    insertion: f64,
    deletion: f64,
}

impl Default for RawWeights {
    fn default() -> Self {
        Self {
            substitution: DEFAULT_WEIGHT,
            insertion: DEFAULT_WEIGHT,
            deletion: DEFAULT_WEIGHT,
        }
    }
}

impl TryFrom<RawWeights> for WeightSet {
    type Error = MatchError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        WeightSet::new(raw.substitution, raw.insertion, raw.deletion)
    }
}

impl Default for WeightSet {
    fn default() -> Self {
        Self {
            substitution: DEFAULT_WEIGHT,
            insertion: DEFAULT_WEIGHT,
            deletion: DEFAULT_WEIGHT,
        }
    }
}

impl WeightSet {
    pub fn new(substitution: f64, insertion: f64, deletion: f64) -> Result<Self, MatchError> {
        let mut weights = Self::default();
        weights.set(WeightKind::Substitution, substitution)?;
        weights.set(WeightKind::Insertion, insertion)?;
        weights.set(WeightKind::Deletion, deletion)?;
        Ok(weights)
    }

    pub fn get(&self, kind: WeightKind) -> f64 {
        match kind {
            WeightKind::Substitution => self.substitution,
            WeightKind::Insertion => self.insertion,
            WeightKind::Deletion => self.deletion,
        }
    }

    /// Store a new cost for `kind`.
    pub fn set(&mut self, kind: WeightKind, value: f64) -> Result<(), MatchError> {
        check_weight(kind, value)?;
        match kind {
            WeightKind::Substitution => self.substitution = value,
            WeightKind::Insertion => self.insertion = value,
            WeightKind::Deletion => self.deletion = value,
        }
        Ok(())
    }

    /// Dynamically typed assignment: anything but a JSON number is rejected.
    pub fn set_value(&mut self, kind: WeightKind, value: &Value) -> Result<(), MatchError> {
        let number = value.as_f64().ok_or(MatchError::WeightNotNumeric {
            kind,
            found: json_type_name(value),
        })?;
        self.set(kind, number)
    }

    /// Restore all three costs to [`DEFAULT_WEIGHT`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn substitution(&self) -> f64 {
        self.substitution
    }

    pub fn insertion(&self) -> f64 {
        self.insertion
    }

    pub fn deletion(&self) -> f64 {
        self.deletion
    }

    /// Largest of the three costs.
    pub fn max_weight(&self) -> f64 {
        self.substitution.max(self.insertion).max(self.deletion)
    }
}

fn check_weight(kind: WeightKind, value: f64) -> Result<(), MatchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidWeight { kind, value })
    }
}

/// The six comparison metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Levenshtein,
    Sellers,
    Hamming,
    LongestSubsequence,
    LongestSubstring,
    PairDistance,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Levenshtein,
        Metric::Sellers,
        Metric::Hamming,
        Metric::LongestSubsequence,
        Metric::LongestSubstring,
        Metric::PairDistance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Levenshtein => "levenshtein",
            Metric::Sellers => "sellers",
            Metric::Hamming => "hamming",
            Metric::LongestSubsequence => "longest_subsequence",
            Metric::LongestSubstring => "longest_substring",
            Metric::PairDistance => "pair_distance",
        }
    }

    /// Whether the metric reads a [`WeightSet`].
    pub fn uses_weights(&self) -> bool {
        matches!(self, Metric::Levenshtein | Metric::Sellers)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which edit-distance flavour drives a line scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditFlavor {
    /// Weights describe turning the pattern into the target.
    #[default]
    Levenshtein,
    /// Weights describe turning the target into the pattern.
    Sellers,
}

impl From<EditFlavor> for Metric {
    fn from(flavor: EditFlavor) -> Self {
        match flavor {
            EditFlavor::Levenshtein => Metric::Levenshtein,
            EditFlavor::Sellers => Metric::Sellers,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid threshold: {0}")]
    InvalidThreshold(f64),
}

/// Line scan parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub flavor: EditFlavor,
    pub threshold: f64,        // Lines scoring <= threshold are emitted
    pub relative: bool,        // Use search_ratio instead of raw search distance
    pub weights: WeightSet,
    pub with_spans: bool,      // Report where in the line the best hit lies
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            flavor: EditFlavor::Levenshtein,
            threshold: 1.0,
            relative: false,
            weights: WeightSet::default(),
            with_spans: false,
        }
    }
}

impl ScanParams {
    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let params: ScanParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_weights() {
        let weights = WeightSet::default();
        for kind in WeightKind::ALL {
            assert_eq!(weights.get(kind), 1.0);
        }
    }

    #[test]
    fn test_set_and_reset() {
        let mut weights = WeightSet::default();
        weights.set(WeightKind::Insertion, 2.0).unwrap();
        weights.set(WeightKind::Substitution, 0.5).unwrap();
        assert_eq!(weights.insertion(), 2.0);
        assert_eq!(weights.substitution(), 0.5);
        assert_eq!(weights.deletion(), 1.0);
        assert_eq!(weights.max_weight(), 2.0);

        weights.reset();
        assert_eq!(weights, WeightSet::default());
    }

    #[test]
    fn test_rejected_weight_keeps_previous_value() {
        let mut weights = WeightSet::default();
        weights.set(WeightKind::Deletion, 3.0).unwrap();

        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = weights.set(WeightKind::Deletion, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
            assert_eq!(weights.deletion(), 3.0);
        }
    }

    #[test]
    fn test_set_value_requires_number() {
        let mut weights = WeightSet::default();
        let err = weights
            .set_value(WeightKind::Substitution, &json!("something"))
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::WeightNotNumeric {
                kind: WeightKind::Substitution,
                found: "string"
            }
        );
        assert!(weights.set_value(WeightKind::Insertion, &json!(null)).is_err());
        assert_eq!(weights, WeightSet::default());

        weights.set_value(WeightKind::Insertion, &json!(2)).unwrap();
        assert_eq!(weights.insertion(), 2.0);
    }

    #[test]
    fn test_weights_deserialize_validated() {
        let weights: WeightSet = serde_json::from_str(r#"{"insertion": 2.5}"#).unwrap();
        assert_eq!(weights.insertion(), 2.5);
        assert_eq!(weights.substitution(), 1.0);

        let bad: Result<WeightSet, _> = serde_json::from_str(r#"{"deletion": -1}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_metric_names() {
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            [
                "levenshtein",
                "sellers",
                "hamming",
                "longest_subsequence",
                "longest_substring",
                "pair_distance"
            ]
        );
        assert!(Metric::Sellers.uses_weights());
        assert!(!Metric::PairDistance.uses_weights());
        let parsed: Metric = serde_json::from_str("\"longest_substring\"").unwrap();
        assert_eq!(parsed, Metric::LongestSubstring);
    }

    #[test]
    fn test_scan_params_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(
            &path,
            r#"{"flavor": "sellers", "threshold": 0.25, "relative": true,
                "weights": {"substitution": 2}}"#,
        )
        .unwrap();

        let params = ScanParams::from_json_file(&path).unwrap();
        assert_eq!(params.flavor, EditFlavor::Sellers);
        assert_eq!(params.threshold, 0.25);
        assert!(params.relative);
        assert_eq!(params.weights.substitution(), 2.0);
        assert!(!params.with_spans);
    }
}
