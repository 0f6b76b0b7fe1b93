//! Longest common subsequence and longest common substring lengths.
//!
//! Both kernels scan the same (m+1) x (n+1) table shape, row by row, keeping
//! only the previous row.

/// Length of the longest sequence of symbols appearing in both inputs in
/// the same relative order, not necessarily contiguous.
pub fn longest_subsequence<T: PartialEq>(pattern: &[T], target: &[T]) -> usize {
    if pattern.is_empty() || target.is_empty() {
        return 0;
    }

    let n = target.len();
    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];

    for p in pattern {
        for (j, t) in target.iter().enumerate() {
            curr[j + 1] = if p == t {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Length of the longest contiguous run shared by both inputs.
pub fn longest_substring<T: PartialEq>(pattern: &[T], target: &[T]) -> usize {
    if pattern.is_empty() || target.is_empty() {
        return 0;
    }

    let n = target.len();
    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];
    let mut longest = 0usize;

    for p in pattern {
        for (j, t) in target.iter().enumerate() {
            curr[j + 1] = if p == t { prev[j] + 1 } else { 0 };
            longest = longest.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    longest
}
