//! Hamming distance generalized to sequences of unequal length.

/// Positional mismatches over the common prefix length, plus one unit for
/// every symbol the longer sequence has beyond it.
#[inline]
pub fn hamming_distance<T: PartialEq>(pattern: &[T], target: &[T]) -> usize {
    let excess = pattern.len().abs_diff(target.len());
    let mismatches = pattern
        .iter()
        .zip(target.iter())
        .filter(|(p, t)| p != t)
        .count();
    excess + mismatches
}
