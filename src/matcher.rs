//! Pattern-bound matchers and the shared batch contract.
//!
//! Each metric has a typed matcher owning its pattern (and, for the edit
//! distances, a [`WeightSet`]). [`Matcher`] closes over all six so callers
//! can pick a metric at runtime. Every call reads the pattern and weights as
//! they are at call time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::align::{edit_distance, locate, search_distance, EditCosts, SearchHit};
use crate::hamming::hamming_distance;
use crate::lcs;
use crate::models::{json_type_name, EditFlavor, MatchError, Metric, WeightKind, WeightSet};
use crate::pair::{self, FieldSplitter, PairMode};

/// An owned pattern with its symbols decoded once per assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    text: String,
    symbols: Vec<char>,
}

impl Pattern {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let symbols = text.chars().collect();
        Self { text, symbols }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Length in symbols, the unit of every normalization.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A single target or an ordered collection of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    One(String),
    Many(Vec<String>),
}

impl Targets {
    /// Accept a JSON string or array of strings.
    ///
    /// Every element is checked before anything is returned, so a batch
    /// with one bad element yields an error and no partial results.
    pub fn from_json(value: &Value) -> Result<Self, MatchError> {
        match value {
            Value::String(s) => Ok(Targets::One(s.clone())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(MatchError::TargetNotString {
                        position: i + 1,
                        found: json_type_name(other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Targets::Many),
            other => Err(MatchError::TargetNotString {
                position: 1,
                found: json_type_name(other),
            }),
        }
    }

    /// Apply `f` to every target, preserving shape and order.
    pub fn map<F: FnMut(&str) -> f64>(&self, mut f: F) -> Scores {
        match self {
            Targets::One(t) => Scores::One(f(t.as_str())),
            Targets::Many(ts) => Scores::Many(ts.iter().map(|t| f(t.as_str())).collect()),
        }
    }
}

impl From<&str> for Targets {
    fn from(target: &str) -> Self {
        Targets::One(target.to_string())
    }
}

impl From<String> for Targets {
    fn from(target: String) -> Self {
        Targets::One(target)
    }
}

impl From<Vec<String>> for Targets {
    fn from(targets: Vec<String>) -> Self {
        Targets::Many(targets)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(targets: Vec<&str>) -> Self {
        Targets::Many(targets.into_iter().map(String::from).collect())
    }
}

/// Results shaped like the [`Targets`] they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scores {
    One(f64),
    Many(Vec<f64>),
}

impl Scores {
    pub fn to_json(&self) -> Value {
        match self {
            Scores::One(v) => Value::from(*v),
            Scores::Many(vs) => Value::Array(vs.iter().map(|&v| Value::from(v)).collect()),
        }
    }
}

/// Score each target in order.
pub fn each<S, F>(targets: &[S], mut f: F) -> Vec<f64>
where
    S: AsRef<str>,
    F: FnMut(&str) -> f64,
{
    targets.iter().map(|t| f(t.as_ref())).collect()
}

/// A matcher reduced to its primary score.
pub trait Scorer {
    fn pattern(&self) -> &str;

    fn score(&self, target: &str) -> f64;

    fn score_all<S: AsRef<str>>(&self, targets: &[S]) -> Vec<f64>
    where
        Self: Sized,
    {
        each(targets, |t| self.score(t))
    }
}

/// Named query operations across all metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Match,
    MatchRatio,
    Search,
    SearchRatio,
    Compare,
    CompareRatio,
    Similar,
    Hamming,
    LongestSubsequence,
    LongestSubstring,
    PairDistance,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Match,
        Operation::MatchRatio,
        Operation::Search,
        Operation::SearchRatio,
        Operation::Compare,
        Operation::CompareRatio,
        Operation::Similar,
        Operation::Hamming,
        Operation::LongestSubsequence,
        Operation::LongestSubstring,
        Operation::PairDistance,
    ];

    /// The operation [`Matcher::score`] runs for `metric`.
    pub fn primary(metric: Metric) -> Self {
        match metric {
            Metric::Levenshtein | Metric::Sellers => Operation::Match,
            Metric::Hamming => Operation::Hamming,
            Metric::LongestSubsequence => Operation::LongestSubsequence,
            Metric::LongestSubstring => Operation::LongestSubstring,
            Metric::PairDistance => Operation::PairDistance,
        }
    }
}

/// Divide by the longer of the two lengths; nothing to normalize is 0.
#[inline]
fn per_symbol(value: f64, pattern_len: usize, target_len: usize) -> f64 {
    let longest = pattern_len.max(target_len);
    if longest == 0 {
        0.0
    } else {
        value / longest as f64
    }
}

/// Weighted edit distance matcher, shared by Levenshtein and Sellers.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDistance {
    pattern: Pattern,
    weights: WeightSet,
    flavor: EditFlavor,
}

impl EditDistance {
    pub fn new(pattern: impl Into<String>, flavor: EditFlavor) -> Self {
        Self {
            pattern: Pattern::new(pattern),
            weights: WeightSet::default(),
            flavor,
        }
    }

    pub fn levenshtein(pattern: impl Into<String>) -> Self {
        Self::new(pattern, EditFlavor::Levenshtein)
    }

    pub fn sellers(pattern: impl Into<String>) -> Self {
        Self::new(pattern, EditFlavor::Sellers)
    }

    pub fn with_weights(mut self, weights: WeightSet) -> Self {
        self.weights = weights;
        self
    }

    pub fn flavor(&self) -> EditFlavor {
        self.flavor
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Pattern::new(pattern);
        debug!(pattern = self.pattern.as_str(), len = self.pattern.len(), "pattern set");
    }

    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    pub fn weight(&self, kind: WeightKind) -> f64 {
        self.weights.get(kind)
    }

    pub fn set_weight(&mut self, kind: WeightKind, value: f64) -> Result<(), MatchError> {
        self.weights.set(kind, value)?;
        debug!(%kind, value, "weight set");
        Ok(())
    }

    pub fn reset_weights(&mut self) {
        self.weights.reset();
    }

    /// The current weights mapped onto the DP table for this flavour.
    pub fn costs(&self) -> EditCosts {
        EditCosts::for_flavor(&self.weights, self.flavor)
    }

    /// Full-string weighted edit distance.
    pub fn match_distance(&self, target: &str) -> f64 {
        let target: Vec<char> = target.chars().collect();
        edit_distance(self.pattern.symbols(), &target, &self.costs())
    }

    /// [`match_distance`](Self::match_distance) per symbol of the longer string.
    pub fn match_ratio(&self, target: &str) -> f64 {
        let target_len = target.chars().count();
        per_symbol(self.match_distance(target), self.pattern.len(), target_len)
    }

    /// Best alignment of the pattern against any substring of `target`.
    pub fn search(&self, target: &str) -> f64 {
        let target: Vec<char> = target.chars().collect();
        search_distance(self.pattern.symbols(), &target, &self.costs())
    }

    /// [`search`](Self::search) per symbol of the longer string.
    pub fn search_ratio(&self, target: &str) -> f64 {
        let target_len = target.chars().count();
        per_symbol(self.search(target), self.pattern.len(), target_len)
    }

    /// Signed distance: negative when `target` is shorter than the pattern.
    pub fn compare(&self, target: &str) -> f64 {
        let distance = self.match_distance(target);
        if distance == 0.0 {
            0.0
        } else if target.chars().count() < self.pattern.len() {
            -distance
        } else {
            distance
        }
    }

    /// [`compare`](Self::compare) per symbol of the longer string.
    pub fn compare_ratio(&self, target: &str) -> f64 {
        let target_len = target.chars().count();
        per_symbol(self.compare(target), self.pattern.len(), target_len)
    }

    /// Similarity in `[0, 1]` for default weights; 1.0 for identical strings.
    ///
    /// Sellers also divides by the largest weight, which keeps the result in
    /// range under non-uniform weights.
    pub fn similar(&self, target: &str) -> f64 {
        let target_len = target.chars().count();
        let longest = self.pattern.len().max(target_len);
        if longest == 0 {
            return 1.0;
        }

        let distance = self.match_distance(target);
        let scale = match self.flavor {
            EditFlavor::Levenshtein => longest as f64,
            EditFlavor::Sellers => {
                let max_weight = self.weights.max_weight();
                if max_weight == 0.0 {
                    return 1.0;
                }
                longest as f64 * max_weight
            }
        };
        1.0 - distance / scale
    }

    /// Where in `target` the best [`search`](Self::search) hit lies.
    pub fn locate(&self, target: &str) -> SearchHit {
        let target: Vec<char> = target.chars().collect();
        locate(self.pattern.symbols(), &target, &self.costs())
    }
}

impl Scorer for EditDistance {
    fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn score(&self, target: &str) -> f64 {
        self.match_distance(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hamming {
    pattern: Pattern,
}

impl Hamming {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::new(pattern),
        }
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Pattern::new(pattern);
    }

    pub fn hamming(&self, target: &str) -> usize {
        let target: Vec<char> = target.chars().collect();
        hamming_distance(self.pattern.symbols(), &target)
    }
}

impl Scorer for Hamming {
    fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn score(&self, target: &str) -> f64 {
        self.hamming(target) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestSubsequence {
    pattern: Pattern,
}

impl LongestSubsequence {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::new(pattern),
        }
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Pattern::new(pattern);
    }

    pub fn longest_subsequence(&self, target: &str) -> usize {
        let target: Vec<char> = target.chars().collect();
        lcs::longest_subsequence(self.pattern.symbols(), &target)
    }
}

impl Scorer for LongestSubsequence {
    fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn score(&self, target: &str) -> f64 {
        self.longest_subsequence(target) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestSubstring {
    pattern: Pattern,
}

impl LongestSubstring {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::new(pattern),
        }
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Pattern::new(pattern);
    }

    pub fn longest_substring(&self, target: &str) -> usize {
        let target: Vec<char> = target.chars().collect();
        lcs::longest_substring(self.pattern.symbols(), &target)
    }
}

impl Scorer for LongestSubstring {
    fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn score(&self, target: &str) -> f64 {
        self.longest_substring(target) as f64
    }
}

/// Dice-coefficient matcher; [`PairMode`] picks what is compared.
#[derive(Debug, Clone)]
pub struct PairDistance {
    pattern: Pattern,
    mode: PairMode,
}

impl PairDistance {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::new(pattern),
            mode: PairMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: PairMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> &PairMode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: PairMode) {
        self.mode = mode;
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = Pattern::new(pattern);
    }

    pub fn pair_distance(&self, target: &str) -> f64 {
        pair::pair_distance(self.pattern.as_str(), target)
    }

    pub fn pair_distance_split(&self, target: &str, splitter: &FieldSplitter) -> f64 {
        pair::pair_distance_split(self.pattern.as_str(), target, splitter)
    }

    pub fn field_bigram_distance(&self, target: &str, splitter: &FieldSplitter) -> f64 {
        pair::field_bigram_distance(self.pattern.as_str(), target, splitter)
    }
}

impl Scorer for PairDistance {
    fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn score(&self, target: &str) -> f64 {
        self.mode.distance(self.pattern.as_str(), target)
    }
}

/// Any of the six metrics bound to a pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    Levenshtein(EditDistance),
    Sellers(EditDistance),
    Hamming(Hamming),
    LongestSubsequence(LongestSubsequence),
    LongestSubstring(LongestSubstring),
    PairDistance(PairDistance),
}

impl Matcher {
    pub fn new(pattern: impl Into<String>, metric: Metric) -> Self {
        let pattern = pattern.into();
        match metric {
            Metric::Levenshtein => Matcher::Levenshtein(EditDistance::levenshtein(pattern)),
            Metric::Sellers => Matcher::Sellers(EditDistance::sellers(pattern)),
            Metric::Hamming => Matcher::Hamming(Hamming::new(pattern)),
            Metric::LongestSubsequence => {
                Matcher::LongestSubsequence(LongestSubsequence::new(pattern))
            }
            Metric::LongestSubstring => Matcher::LongestSubstring(LongestSubstring::new(pattern)),
            Metric::PairDistance => Matcher::PairDistance(PairDistance::new(pattern)),
        }
    }

    /// Build from a dynamically typed pattern; anything but a string fails.
    pub fn from_json(pattern: &Value, metric: Metric) -> Result<Self, MatchError> {
        match pattern {
            Value::String(s) => Ok(Self::new(s.as_str(), metric)),
            other => Err(MatchError::PatternNotString {
                found: json_type_name(other),
            }),
        }
    }

    pub fn metric(&self) -> Metric {
        match self {
            Matcher::Levenshtein(_) => Metric::Levenshtein,
            Matcher::Sellers(_) => Metric::Sellers,
            Matcher::Hamming(_) => Metric::Hamming,
            Matcher::LongestSubsequence(_) => Metric::LongestSubsequence,
            Matcher::LongestSubstring(_) => Metric::LongestSubstring,
            Matcher::PairDistance(_) => Metric::PairDistance,
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => Scorer::pattern(m),
            Matcher::Hamming(m) => m.pattern(),
            Matcher::LongestSubsequence(m) => m.pattern(),
            Matcher::LongestSubstring(m) => m.pattern(),
            Matcher::PairDistance(m) => m.pattern(),
        }
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => m.set_pattern(pattern),
            Matcher::Hamming(m) => m.set_pattern(pattern),
            Matcher::LongestSubsequence(m) => m.set_pattern(pattern),
            Matcher::LongestSubstring(m) => m.set_pattern(pattern),
            Matcher::PairDistance(m) => m.set_pattern(pattern),
        }
    }

    /// Dynamically typed reassignment; the pattern is kept on error.
    pub fn set_pattern_value(&mut self, pattern: &Value) -> Result<(), MatchError> {
        match pattern {
            Value::String(s) => {
                self.set_pattern(s.as_str());
                Ok(())
            }
            other => Err(MatchError::PatternNotString {
                found: json_type_name(other),
            }),
        }
    }

    /// The edit-distance matcher behind a Levenshtein or Sellers variant.
    pub fn as_edit(&self) -> Option<&EditDistance> {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_edit_mut(&mut self) -> Option<&mut EditDistance> {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => Some(m),
            _ => None,
        }
    }

    pub fn weights(&self) -> Option<&WeightSet> {
        self.as_edit().map(EditDistance::weights)
    }

    /// Current weight, or `None` for metrics without weights.
    pub fn weight(&self, kind: WeightKind) -> Option<f64> {
        self.as_edit().map(|m| m.weight(kind))
    }

    /// Set a weight on Levenshtein/Sellers.
    ///
    /// The value is validated for every metric, so an invalid weight is
    /// always an error; on metrics without weights a valid value is ignored.
    pub fn set_weight(&mut self, kind: WeightKind, value: f64) -> Result<(), MatchError> {
        match self.as_edit_mut() {
            Some(m) => m.set_weight(kind, value),
            None => WeightSet::default().set(kind, value),
        }
    }

    /// Dynamically typed weight assignment.
    pub fn set_weight_value(&mut self, kind: WeightKind, value: &Value) -> Result<(), MatchError> {
        let number = value.as_f64().ok_or(MatchError::WeightNotNumeric {
            kind,
            found: json_type_name(value),
        })?;
        self.set_weight(kind, number)
    }

    /// Restore default weights; a no-op for metrics without weights.
    pub fn reset_weights(&mut self) {
        if let Some(m) = self.as_edit_mut() {
            m.reset_weights();
        }
    }

    pub fn supports(&self, op: Operation) -> bool {
        match self {
            Matcher::Levenshtein(_) | Matcher::Sellers(_) => matches!(
                op,
                Operation::Match
                    | Operation::MatchRatio
                    | Operation::Search
                    | Operation::SearchRatio
                    | Operation::Compare
                    | Operation::CompareRatio
                    | Operation::Similar
            ),
            Matcher::Hamming(_) => op == Operation::Hamming,
            Matcher::LongestSubsequence(_) => op == Operation::LongestSubsequence,
            Matcher::LongestSubstring(_) => op == Operation::LongestSubstring,
            Matcher::PairDistance(_) => op == Operation::PairDistance,
        }
    }

    /// Run a named operation, or `None` when the metric does not define it.
    pub fn apply(&self, op: Operation, target: &str) -> Option<f64> {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => match op {
                Operation::Match => Some(m.match_distance(target)),
                Operation::MatchRatio => Some(m.match_ratio(target)),
                Operation::Search => Some(m.search(target)),
                Operation::SearchRatio => Some(m.search_ratio(target)),
                Operation::Compare => Some(m.compare(target)),
                Operation::CompareRatio => Some(m.compare_ratio(target)),
                Operation::Similar => Some(m.similar(target)),
                Operation::Hamming
                | Operation::LongestSubsequence
                | Operation::LongestSubstring
                | Operation::PairDistance => None,
            },
            Matcher::Hamming(m) => (op == Operation::Hamming).then(|| m.score(target)),
            Matcher::LongestSubsequence(m) => {
                (op == Operation::LongestSubsequence).then(|| m.score(target))
            }
            Matcher::LongestSubstring(m) => {
                (op == Operation::LongestSubstring).then(|| m.score(target))
            }
            Matcher::PairDistance(m) => (op == Operation::PairDistance).then(|| m.score(target)),
        }
    }

    /// The metric's primary value.
    pub fn score(&self, target: &str) -> f64 {
        match self {
            Matcher::Levenshtein(m) | Matcher::Sellers(m) => m.score(target),
            Matcher::Hamming(m) => m.score(target),
            Matcher::LongestSubsequence(m) => m.score(target),
            Matcher::LongestSubstring(m) => m.score(target),
            Matcher::PairDistance(m) => m.score(target),
        }
    }

    pub fn score_all<S: AsRef<str>>(&self, targets: &[S]) -> Vec<f64> {
        each(targets, |t| self.score(t))
    }

    /// Primary score, shaped like the input.
    pub fn evaluate(&self, targets: &Targets) -> Scores {
        targets.map(|t| self.score(t))
    }

    /// Named operation, shaped like the input.
    pub fn evaluate_op(&self, op: Operation, targets: &Targets) -> Option<Scores> {
        if !self.supports(op) {
            return None;
        }
        Some(targets.map(|t| self.apply(op, t).unwrap_or(f64::NAN)))
    }

    /// Primary score over a JSON string or array of strings.
    pub fn evaluate_json(&self, value: &Value) -> Result<Value, MatchError> {
        let targets = Targets::from_json(value)?;
        Ok(self.evaluate(&targets).to_json())
    }

    /// Named operation over a JSON string or array of strings.
    ///
    /// Input types are checked first; `Ok(None)` means the metric does not
    /// define `op`.
    pub fn evaluate_op_json(&self, op: Operation, value: &Value) -> Result<Option<Value>, MatchError> {
        let targets = Targets::from_json(value)?;
        Ok(self.evaluate_op(op, &targets).map(|s| s.to_json()))
    }
}
