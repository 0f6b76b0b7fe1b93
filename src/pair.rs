//! Bigram and token pair distance (Dice coefficient).
//!
//! A string is reduced either to the multiset of its overlapping two-symbol
//! windows, or, given a [`FieldSplitter`], to its set of fields. Similarity is
//! `2 * |common| / (|a| + |b|)`.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Rule partitioning a string into fields.
#[derive(Debug, Clone)]
pub enum FieldSplitter {
    /// Runs of Unicode whitespace separate fields.
    Whitespace,
    /// Every match of the regex separates fields.
    Pattern(Regex),
}

impl FieldSplitter {
    /// Compile a regex delimiter.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(FieldSplitter::Pattern(Regex::new(pattern)?))
    }

    /// Split `text` into its non-empty fields, in order.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            FieldSplitter::Whitespace => text.split_whitespace().collect(),
            FieldSplitter::Pattern(re) => re.split(text).filter(|f| !f.is_empty()).collect(),
        }
    }
}

/// How strings are reduced before their Dice coefficient is taken.
#[derive(Debug, Clone, Default)]
pub enum PairMode {
    /// Bigrams of the whole strings.
    #[default]
    Bigrams,
    /// Sets of fields.
    TokenSet(FieldSplitter),
    /// Bigrams taken inside each field.
    FieldBigrams(FieldSplitter),
}

impl PairMode {
    pub fn distance(&self, pattern: &str, target: &str) -> f64 {
        match self {
            PairMode::Bigrams => pair_distance(pattern, target),
            PairMode::TokenSet(splitter) => pair_distance_split(pattern, target, splitter),
            PairMode::FieldBigrams(splitter) => field_bigram_distance(pattern, target, splitter),
        }
    }
}

/// Count overlapping bigrams of a symbol sequence.
///
/// Sequences shorter than two symbols have none.
pub fn bigram_counts<T: Eq + Hash + Copy>(symbols: &[T]) -> HashMap<(T, T), usize> {
    let mut counts = HashMap::new();
    for w in symbols.windows(2) {
        *counts.entry((w[0], w[1])).or_insert(0) += 1;
    }
    counts
}

/// Dice coefficient of two bigram multisets.
///
/// Two empty multisets are identical (1.0).
pub fn dice_multiset<K: Eq + Hash>(a: &HashMap<K, usize>, b: &HashMap<K, usize>) -> f64 {
    let total: usize = a.values().sum::<usize>() + b.values().sum::<usize>();
    if total == 0 {
        return 1.0;
    }

    let common: usize = a
        .iter()
        .filter_map(|(k, &ca)| b.get(k).map(|&cb| ca.min(cb)))
        .sum();

    2.0 * common as f64 / total as f64
}

/// Dice coefficient of two sets. Two empty sets are identical (1.0).
pub fn dice_set<K: Eq + Hash>(a: &HashSet<K>, b: &HashSet<K>) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let common = a.intersection(b).count();
    2.0 * common as f64 / total as f64
}

/// Dice similarity over the bigrams of the whole strings.
pub fn pair_distance(pattern: &str, target: &str) -> f64 {
    let a: Vec<char> = pattern.chars().collect();
    let b: Vec<char> = target.chars().collect();
    dice_multiset(&bigram_counts(&a), &bigram_counts(&b))
}

/// Dice similarity over the sets of fields of both strings.
///
/// Duplicated fields count once.
pub fn pair_distance_split(pattern: &str, target: &str, splitter: &FieldSplitter) -> f64 {
    let a: HashSet<&str> = splitter.split(pattern).into_iter().collect();
    let b: HashSet<&str> = splitter.split(target).into_iter().collect();
    dice_set(&a, &b)
}

/// Dice similarity over bigrams taken inside each field.
///
/// No bigram spans a field boundary, so word order does not matter.
pub fn field_bigram_distance(pattern: &str, target: &str, splitter: &FieldSplitter) -> f64 {
    dice_multiset(
        &field_bigram_counts(pattern, splitter),
        &field_bigram_counts(target, splitter),
    )
}

fn field_bigram_counts(text: &str, splitter: &FieldSplitter) -> HashMap<(char, char), usize> {
    let mut counts = HashMap::new();
    for field in splitter.split(text) {
        let symbols: Vec<char> = field.chars().collect();
        for (bigram, count) in bigram_counts(&symbols) {
            *counts.entry(bigram).or_insert(0) += count;
        }
    }
    counts
}
