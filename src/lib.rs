//! Approximate string matching.
//!
//! Six metrics bound to a pattern: weighted Levenshtein distance, Sellers
//! substring search, generalized Hamming distance, longest common
//! subsequence and substring, and bigram pair distance (Dice coefficient).
//! Strings are compared per Unicode scalar value.
//!
//! # Example
//!
//! ```
//! use amatch::prelude::*;
//!
//! let mut m = EditDistance::levenshtein("test");
//! assert_eq!(m.match_distance("tast"), 1.0);
//! assert_eq!(m.search("aaatestbbb"), 0.0);
//!
//! m.set_weight(WeightKind::Substitution, 2.0).unwrap();
//! assert_eq!(m.match_distance("tast"), 2.0);
//! ```
//!
//! # Batch Example
//!
//! ```
//! use amatch::prelude::*;
//!
//! let m = Matcher::new("test", Metric::Levenshtein);
//! let scores = m.evaluate(&Targets::from(vec!["tets", "test"]));
//! assert_eq!(scores, Scores::Many(vec![2.0, 0.0]));
//! ```

pub mod align;
pub mod hamming;
pub mod lcs;
pub mod matcher;
pub mod models;
pub mod output;
pub mod pair;
pub mod scan;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::align::{edit_distance, locate, search_distance, EditCosts, SearchHit};
    pub use crate::hamming::hamming_distance;
    pub use crate::lcs::{longest_subsequence, longest_substring};
    pub use crate::matcher::{
        EditDistance, Hamming, LongestSubsequence, LongestSubstring, Matcher, Operation,
        PairDistance, Pattern, Scorer, Scores, Targets,
    };
    pub use crate::models::{
        ConfigError, EditFlavor, ErrorKind, MatchError, Metric, ScanParams, WeightKind, WeightSet,
    };
    pub use crate::output::{
        format_match, format_timing, write_json, write_json_line, write_plain, write_summary,
        OutputError,
    };
    pub use crate::pair::{field_bigram_distance, pair_distance, pair_distance_split, FieldSplitter, PairMode};
    pub use crate::scan::{FileScan, LineMatch, LineScanner, ScanError, ScanSummary};
}

// Re-export commonly used types at the crate root
pub use matcher::{EditDistance, Matcher, Operation, Scores, Targets};
pub use models::{EditFlavor, MatchError, Metric, WeightKind, WeightSet};
