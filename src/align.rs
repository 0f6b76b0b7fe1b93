//! Weighted edit-distance kernels.
//!
//! This is the HOT PATH shared by the Levenshtein and Sellers matchers.
//! Rows of the DP table walk the pattern, columns walk the target. Distances
//! only need two rolling rows; `locate` keeps the full table for traceback.

use crate::models::{EditFlavor, WeightSet};
use serde::{Deserialize, Serialize};

/// Costs as seen by the DP table.
///
/// The kernel does not know about "insertion" or "deletion"; it only knows
/// whether a pattern symbol or a target symbol was left without a partner.
/// [`EditCosts::for_flavor`] maps a [`WeightSet`] onto these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditCosts {
    pub substitution: f64,
    pub pattern_gap: f64, // Pattern symbol with no counterpart in the target
    pub target_gap: f64,  // Target symbol with no counterpart in the pattern
}

impl EditCosts {
    /// Levenshtein reads weights as edits turning the pattern into the
    /// target; Sellers reads them as edits turning the target into the
    /// pattern.
    #[inline]
    pub fn for_flavor(weights: &WeightSet, flavor: EditFlavor) -> Self {
        match flavor {
            EditFlavor::Levenshtein => Self {
                substitution: weights.substitution(),
                pattern_gap: weights.deletion(),
                target_gap: weights.insertion(),
            },
            EditFlavor::Sellers => Self {
                substitution: weights.substitution(),
                pattern_gap: weights.insertion(),
                target_gap: weights.deletion(),
            },
        }
    }

    /// Unit costs for all three operations.
    pub fn unit() -> Self {
        Self {
            substitution: 1.0,
            pattern_gap: 1.0,
            target_gap: 1.0,
        }
    }
}

/// Best semi-global hit of a pattern inside a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub start: usize, // First target symbol of the hit
    pub end: usize,   // One past the last target symbol of the hit
    pub distance: f64,
}

/// Full-string weighted edit distance between `pattern` and `target`.
#[inline]
pub fn edit_distance<T: PartialEq>(pattern: &[T], target: &[T], costs: &EditCosts) -> f64 {
    let row = last_row(pattern, target, costs, false);
    row[target.len()]
}

/// Minimum cost of aligning `pattern` against any substring of `target`.
///
/// Leading and trailing target symbols outside the aligned substring are
/// free. An empty target leaves only the cost of dropping every pattern
/// symbol.
#[inline]
pub fn search_distance<T: PartialEq>(pattern: &[T], target: &[T], costs: &EditCosts) -> f64 {
    let row = last_row(pattern, target, costs, true);
    row.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Compute the final DP row with two rolling rows.
///
/// `free_start` zeroes the first row so the alignment may begin anywhere
/// in the target.
fn last_row<T: PartialEq>(
    pattern: &[T],
    target: &[T],
    costs: &EditCosts,
    free_start: bool,
) -> Vec<f64> {
    let n = target.len();

    let mut prev: Vec<f64> = if free_start {
        vec![0.0; n + 1]
    } else {
        let mut row = vec![0.0; n + 1];
        for j in 1..=n {
            row[j] = row[j - 1] + costs.target_gap;
        }
        row
    };
    let mut curr = vec![0.0f64; n + 1];

    for p in pattern {
        curr[0] = prev[0] + costs.pattern_gap;

        for (j, t) in target.iter().enumerate() {
            let diagonal = prev[j] + if p == t { 0.0 } else { costs.substitution };
            let up = prev[j + 1] + costs.pattern_gap;
            let left = curr[j] + costs.target_gap;
            curr[j + 1] = diagonal.min(up).min(left);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev
}

/// Semi-global search with traceback.
///
/// Returns the target span realizing [`search_distance`]. When several end
/// columns share the minimum, the leftmost wins.
pub fn locate<T: PartialEq>(pattern: &[T], target: &[T], costs: &EditCosts) -> SearchHit {
    let m = pattern.len();
    let n = target.len();

    // DP matrix - use flat Vec for traceback
    // H[i][j] = H[i * (n+1) + j]
    let width = n + 1;
    let mut h = vec![0.0f64; (m + 1) * width];

    for i in 1..=m {
        let p = &pattern[i - 1];
        let row_offset = i * width;
        let prev_row_offset = (i - 1) * width;
        h[row_offset] = h[prev_row_offset] + costs.pattern_gap;

        for j in 1..=n {
            let sub = if *p == target[j - 1] { 0.0 } else { costs.substitution };
            let diagonal = h[prev_row_offset + (j - 1)] + sub;
            let up = h[prev_row_offset + j] + costs.pattern_gap;
            let left = h[row_offset + (j - 1)] + costs.target_gap;
            h[row_offset + j] = diagonal.min(up).min(left);
        }
    }

    let last_row_offset = m * width;
    let mut end = 0usize;
    let mut distance = h[last_row_offset];
    for j in 1..=n {
        if h[last_row_offset + j] < distance {
            distance = h[last_row_offset + j];
            end = j;
        }
    }

    // Traceback to the first row, where the alignment started for free
    let mut i = m;
    let mut j = end;
    while i > 0 {
        if j == 0 {
            i -= 1;
            continue;
        }

        let current = h[i * width + j];
        let sub = if pattern[i - 1] == target[j - 1] { 0.0 } else { costs.substitution };

        if current == h[(i - 1) * width + (j - 1)] + sub {
            i -= 1;
            j -= 1;
        } else if current == h[(i - 1) * width + j] + costs.pattern_gap {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    SearchHit {
        start: j,
        end,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightKind;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn dist(p: &str, t: &str) -> f64 {
        edit_distance(&chars(p), &chars(t), &EditCosts::unit())
    }

    fn search(p: &str, t: &str) -> f64 {
        search_distance(&chars(p), &chars(t), &EditCosts::unit())
    }

    #[test]
    fn test_unit_distances() {
        assert_eq!(dist("test", ""), 4.0);
        assert_eq!(dist("", "test"), 4.0);
        assert_eq!(dist("", ""), 0.0);
        assert_eq!(dist("test", "test"), 0.0);
        assert_eq!(dist("test", "testa"), 1.0);
        assert_eq!(dist("test", "atest"), 1.0);
        assert_eq!(dist("test", "tst"), 1.0);
        assert_eq!(dist("test", "taex"), 3.0);
        assert_eq!(dist("test", "aaatestbbb"), 6.0);
        assert_eq!(dist("kitten", "sitting"), 3.0);
    }

    #[test]
    fn test_search_distances() {
        assert_eq!(search("test", ""), 4.0);
        assert_eq!(search("", ""), 0.0);
        assert_eq!(search("", "test"), 0.0);
        assert_eq!(search("test", "aaatestbbb"), 0.0);
        assert_eq!(search("test", "aaataexbbb"), 3.0);
        assert_eq!(search("test", "aaaaaaaaa"), 4.0);
        assert_eq!(search("test", "tetsaaa"), 1.0);
    }

    #[test]
    fn test_search_never_worse_than_match() {
        let pairs = [
            ("test", "aaatestbbb"),
            ("abc", "xaxbxcx"),
            ("hello", "help"),
            ("", "abc"),
            ("abc", ""),
        ];
        for (p, t) in pairs {
            assert!(search(p, t) <= dist(p, t), "{} vs {}", p, t);
        }
    }

    #[test]
    fn test_flavor_directions() {
        let mut weights = WeightSet::default();
        weights.set(WeightKind::Insertion, 2.0).unwrap();

        let lev = EditCosts::for_flavor(&weights, EditFlavor::Levenshtein);
        let sel = EditCosts::for_flavor(&weights, EditFlavor::Sellers);

        // Extra target symbol: an insertion for Levenshtein, a deletion for Sellers
        assert_eq!(edit_distance(&chars("test"), &chars("teist"), &lev), 2.0);
        assert_eq!(edit_distance(&chars("test"), &chars("teist"), &sel), 1.0);

        // Missing pattern symbol: the reverse
        assert_eq!(edit_distance(&chars("test"), &chars("tst"), &lev), 1.0);
        assert_eq!(edit_distance(&chars("test"), &chars("tst"), &sel), 2.0);
    }

    #[test]
    fn test_fractional_weights() {
        let costs = EditCosts {
            substitution: 0.5,
            pattern_gap: 1.0,
            target_gap: 1.0,
        };
        assert_eq!(edit_distance(&chars("test"), &chars("tast"), &costs), 0.5);
    }

    #[test]
    fn test_generic_over_symbols() {
        let a: Vec<u32> = vec![1, 2, 3, 4];
        let b: Vec<u32> = vec![9, 1, 2, 3, 4, 9];
        assert_eq!(edit_distance(&a, &b, &EditCosts::unit()), 2.0);
        assert_eq!(search_distance(&a, &b, &EditCosts::unit()), 0.0);

        assert_eq!(search_distance(&b"abc"[..], &b"zzabczz"[..], &EditCosts::unit()), 0.0);
    }

    #[test]
    fn test_locate_exact_hit() {
        let hit = locate(&chars("test"), &chars("aaatestbbb"), &EditCosts::unit());
        assert_eq!(hit.distance, 0.0);
        assert_eq!((hit.start, hit.end), (3, 7));
    }

    #[test]
    fn test_locate_matches_search_distance() {
        let cases = [("test", "aaataexbbb"), ("test", "tetsaaa"), ("abc", "xxabxcxx")];
        for (p, t) in cases {
            let hit = locate(&chars(p), &chars(t), &EditCosts::unit());
            assert_eq!(hit.distance, search(p, t));
            assert!(hit.start <= hit.end && hit.end <= t.chars().count());
        }
    }

    #[test]
    fn test_locate_empty_inputs() {
        let hit = locate(&chars("test"), &[], &EditCosts::unit());
        assert_eq!((hit.start, hit.end, hit.distance), (0, 0, 4.0));

        let hit = locate(&[], &chars("abc"), &EditCosts::unit());
        assert_eq!((hit.start, hit.end, hit.distance), (0, 0, 0.0));
    }
}
