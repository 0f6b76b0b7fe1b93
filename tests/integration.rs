//! Integration tests for amatch.
//!
//! These tests exercise the public matcher API and the line scanner end to end.

use amatch::matcher::{EditDistance, Matcher, Operation, Scores, Targets};
use amatch::models::{EditFlavor, ErrorKind, MatchError, Metric, ScanParams, WeightKind, WeightSet};
use amatch::pair::{FieldSplitter, PairMode};
use amatch::scan::LineScanner;
use serde_json::json;
use std::io::{Cursor, Write};

const D: f64 = 0.000001;

/// Targets shared by the metric tables below.
const TARGETS: [&str; 13] = [
    "", "test", "testa", "atest", "teast", "est", "tes", "tst", "best", "tost", "tesa", "taex",
    "aaatestbbb",
];

fn table(metric: Metric, op: Operation) -> Vec<f64> {
    let m = Matcher::new("test", metric);
    TARGETS
        .iter()
        .map(|t| m.apply(op, t).expect("operation supported"))
        .collect()
}

#[test]
fn test_levenshtein_tables() {
    assert_eq!(
        table(Metric::Levenshtein, Operation::Match),
        vec![4.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 6.0]
    );
    assert_eq!(
        table(Metric::Levenshtein, Operation::Search),
        vec![4.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 0.0]
    );
}

#[test]
fn test_sellers_matches_levenshtein_with_default_weights() {
    for op in [Operation::Match, Operation::Search, Operation::Compare] {
        assert_eq!(table(Metric::Sellers, op), table(Metric::Levenshtein, op));
    }
}

#[test]
fn test_integer_metric_tables() {
    assert_eq!(
        table(Metric::Hamming, Operation::Hamming),
        vec![4.0, 0.0, 1.0, 5.0, 3.0, 4.0, 1.0, 3.0, 1.0, 1.0, 1.0, 3.0, 9.0]
    );
    assert_eq!(
        table(Metric::LongestSubsequence, Operation::LongestSubsequence),
        vec![0.0, 4.0, 4.0, 4.0, 4.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 2.0, 4.0]
    );
    assert_eq!(
        table(Metric::LongestSubstring, Operation::LongestSubstring),
        vec![0.0, 4.0, 4.0, 4.0, 2.0, 3.0, 3.0, 2.0, 3.0, 2.0, 3.0, 1.0, 4.0]
    );
}

#[test]
fn test_search_never_exceeds_match() {
    for metric in [Metric::Levenshtein, Metric::Sellers] {
        let m = Matcher::new("test", metric);
        for target in TARGETS {
            let search = m.apply(Operation::Search, target).unwrap();
            let full = m.apply(Operation::Match, target).unwrap();
            assert!(search <= full, "{:?}: {} > {}", target, search, full);
        }
    }
}

#[test]
fn test_ratios_bounded_for_unit_weights() {
    let m = Matcher::new("test", Metric::Levenshtein);
    for target in TARGETS {
        for op in [Operation::MatchRatio, Operation::SearchRatio, Operation::Similar] {
            let v = m.apply(op, target).unwrap();
            assert!((0.0..=1.0).contains(&v), "{:?} {:?} = {}", op, target, v);
        }
        let c = m.apply(Operation::CompareRatio, target).unwrap();
        assert!((-1.0..=1.0).contains(&c));
    }
}

#[test]
fn test_pattern_is_read_at_call_time() {
    let mut m = Matcher::new("test", Metric::LongestSubstring);
    assert_eq!(m.score("xbestx"), 3.0);
    m.set_pattern("bestx");
    assert_eq!(m.score("xbestx"), 5.0);
}

#[test]
fn test_batch_contract() {
    let m = Matcher::new("test", Metric::Levenshtein);

    assert_eq!(m.evaluate(&Targets::from("tets")), Scores::One(2.0));
    assert_eq!(
        m.evaluate(&Targets::from(vec!["tets", "test"])),
        Scores::Many(vec![2.0, 0.0])
    );
    assert_eq!(
        m.evaluate_op(Operation::Search, &Targets::from(vec!["tetsaaa", "testaaa"])),
        Some(Scores::Many(vec![1.0, 0.0]))
    );
    assert_eq!(m.evaluate(&Targets::Many(Vec::new())), Scores::Many(Vec::new()));
}

#[test]
fn test_dynamic_entry_point_type_errors() {
    let m = Matcher::new("test", Metric::Hamming);
    assert_eq!(m.evaluate_json(&json!(["tost", "test"])).unwrap(), json!([1.0, 0.0]));

    for bad in [json!(42), json!(null), json!([1, "bar"]), json!(["bar", ["x"]])] {
        let err = m.evaluate_json(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    let err = Matcher::from_json(&json!(true), Metric::Levenshtein).unwrap_err();
    assert_eq!(err, MatchError::PatternNotString { found: "boolean" });
}

#[test]
fn test_weight_validation_across_metrics() {
    for metric in Metric::ALL {
        let mut m = Matcher::new("test", metric);
        for kind in WeightKind::ALL {
            let err = m.set_weight(kind, f64::INFINITY).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
            assert!(m.set_weight(kind, -0.5).is_err());
        }
        assert_eq!(m.weights().is_some(), metric.uses_weights());
    }
}

#[test]
fn test_levenshtein_and_sellers_read_weights_in_opposite_directions() {
    let mut lev = EditDistance::levenshtein("test");
    let mut sel = EditDistance::sellers("test");
    for m in [&mut lev, &mut sel] {
        m.set_weight(WeightKind::Insertion, 3.0).unwrap();
    }

    // Target has one extra symbol
    assert_eq!(lev.match_distance("tesst"), 3.0);
    assert_eq!(sel.match_distance("tesst"), 1.0);

    // Target misses one symbol
    assert_eq!(lev.match_distance("tst"), 1.0);
    assert_eq!(sel.match_distance("tst"), 3.0);
}

#[test]
fn test_pair_distance_modes() {
    let plain = Matcher::new("test", Metric::PairDistance);
    assert!((plain.score("aaatestbbb") - 0.5).abs() < D);

    let csv = FieldSplitter::regex(",").unwrap();
    let mut split = Matcher::new("foo,bar,baz", Metric::PairDistance);
    if let Matcher::PairDistance(ref mut m) = split {
        m.set_mode(PairMode::TokenSet(csv));
    }
    assert_eq!(
        split.evaluate(&Targets::from(vec!["", "foo", "bar,foo", "baz,bar,foo"])),
        Scores::Many(vec![0.0, 0.5, 0.8, 1.0])
    );

    let mut fields = Matcher::new("republic of france", Metric::PairDistance);
    if let Matcher::PairDistance(ref mut m) = fields {
        m.set_mode(PairMode::FieldBigrams(FieldSplitter::Whitespace));
    }
    assert!((fields.score("french republic") - 0.72).abs() < D);
    assert!((fields.score("france") - 0.5555555).abs() < D);
}

#[test]
fn test_scan_params_roundtrip_through_config_file() {
    let params = ScanParams {
        flavor: EditFlavor::Sellers,
        threshold: 0.5,
        relative: true,
        weights: WeightSet::new(1.0, 0.5, 2.0).unwrap(),
        with_spans: true,
    };

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&params).unwrap().as_bytes())
        .unwrap();

    let loaded = ScanParams::from_json_file(file.path()).unwrap();
    assert_eq!(loaded.flavor, EditFlavor::Sellers);
    assert_eq!(loaded.threshold, 0.5);
    assert!(loaded.relative);
    assert_eq!(loaded.weights, params.weights);
    assert!(loaded.with_spans);
}

#[test]
fn test_config_rejects_negative_weight() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"weights": {"insertion": -1.0}}"#).unwrap();
    assert!(ScanParams::from_json_file(file.path()).is_err());
}

#[test]
fn test_scanner_end_to_end() {
    let input = "\
the quick brown fox
an aproximate match
approximate
nothing to see here
";
    let params = ScanParams {
        threshold: 1.0,
        with_spans: true,
        ..ScanParams::default()
    };
    let scanner = LineScanner::new("approximate", &params);

    let mut hits = Vec::new();
    let summary = scanner
        .scan_reader(Cursor::new(input), None, |m| {
            hits.push(m.clone());
            Ok(())
        })
        .unwrap();

    assert_eq!(summary.lines, 4);
    assert_eq!(summary.matches, 2);
    assert_eq!(hits[0].line_number, 2);
    assert_eq!(hits[0].score, 1.0);
    let span = hits[0].span.unwrap();
    assert_eq!((span.start, span.end), (3, 13));
    assert_eq!(hits[1].line, "approximate");
    assert_eq!(hits[1].score, 0.0);
}

#[test]
fn test_scanner_over_files_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for (name, body) in [("a.txt", "test\nxxxx\n"), ("b.txt", "tost\ntest\n")] {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        paths.push(path);
    }

    let scanner = LineScanner::new("test", &ScanParams::default());
    let mut seen = Vec::new();
    let scan = scanner
        .scan_files(&paths, false, |m| {
            seen.push((m.source.clone().unwrap(), m.line_number));
            Ok(())
        })
        .unwrap();

    assert!(scan.failures.is_empty());
    assert_eq!(scan.summary.lines, 4);
    let names: Vec<_> = seen
        .iter()
        .map(|(source, line)| (source.ends_with("a.txt"), *line))
        .collect();
    assert_eq!(names, vec![(true, 1), (false, 1), (false, 2)]);
}
