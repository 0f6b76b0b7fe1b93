//! amatch command line tool
//!
//! `grep` filters lines by approximate match, `score` evaluates any metric
//! against one or more targets, `benchmark` times the edit-distance kernels.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use amatch::matcher::{Matcher, Operation, Targets};
use amatch::models::{EditFlavor, Metric, ScanParams, WeightKind};
use amatch::output::{format_timing, write_json, write_json_line, write_plain, write_summary};
use amatch::pair::{FieldSplitter, PairMode};
use amatch::scan::{LineMatch, LineScanner};

#[derive(Parser)]
#[command(name = "amatch")]
#[command(about = "Approximate string matching: edit distance, substring search, LCS, pair distance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format for matching lines
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Matching lines, prefixed with FILE: when reading files
    Plain,
    /// One JSON object per matching line
    Json,
}

/// Edit distance flavour for grep (CLI version, mirrors models::EditFlavor)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliEditFlavor {
    /// Weights describe edits turning the pattern into the line
    Levenshtein,
    /// Weights describe edits turning the line into the pattern
    Sellers,
}

impl From<CliEditFlavor> for EditFlavor {
    fn from(flavor: CliEditFlavor) -> Self {
        match flavor {
            CliEditFlavor::Levenshtein => EditFlavor::Levenshtein,
            CliEditFlavor::Sellers => EditFlavor::Sellers,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMetric {
    Levenshtein,
    Sellers,
    Hamming,
    LongestSubsequence,
    LongestSubstring,
    PairDistance,
}

impl From<CliMetric> for Metric {
    fn from(metric: CliMetric) -> Self {
        match metric {
            CliMetric::Levenshtein => Metric::Levenshtein,
            CliMetric::Sellers => Metric::Sellers,
            CliMetric::Hamming => Metric::Hamming,
            CliMetric::LongestSubsequence => Metric::LongestSubsequence,
            CliMetric::LongestSubstring => Metric::LongestSubstring,
            CliMetric::PairDistance => Metric::PairDistance,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliOperation {
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

impl From<CliOperation> for Operation {
    fn from(op: CliOperation) -> Self {
        match op {
            CliOperation::Match => Operation::Match,
            CliOperation::MatchRatio => Operation::MatchRatio,
            CliOperation::Search => Operation::Search,
            CliOperation::SearchRatio => Operation::SearchRatio,
            CliOperation::Compare => Operation::Compare,
            CliOperation::CompareRatio => Operation::CompareRatio,
            CliOperation::Similar => Operation::Similar,
            CliOperation::Hamming => Operation::Hamming,
            CliOperation::LongestSubsequence => Operation::LongestSubsequence,
            CliOperation::LongestSubstring => Operation::LongestSubstring,
            CliOperation::PairDistance => Operation::PairDistance,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print lines approximately matching PATTERN
    ///
    /// Parameters default to ScanParams::default() or to the --config file.
    /// Flags given explicitly override either.
    Grep {
        /// Pattern to search for
        pattern: String,

        /// Files to scan (stdin when none are given)
        files: Vec<PathBuf>,

        /// Maximum score for a line to match [default: 1.0]
        #[arg(short, long)]
        distance: Option<f64>,

        /// Compare search_ratio instead of the raw search distance
        #[arg(short, long)]
        relative: bool,

        /// Report timing and scan counters on stderr
        #[arg(short, long)]
        verbose: bool,

        /// Edit distance flavour [default: levenshtein]
        #[arg(long, value_enum)]
        metric: Option<CliEditFlavor>,

        /// Substitution weight [default: 1.0]
        #[arg(long)]
        substitution: Option<f64>,

        /// Insertion weight [default: 1.0]
        #[arg(long)]
        insertion: Option<f64>,

        /// Deletion weight [default: 1.0]
        #[arg(long)]
        deletion: Option<f64>,

        /// JSON file with scan parameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "plain")]
        format: OutputFormat,

        /// Show where in each line the best hit lies
        #[arg(long)]
        spans: bool,

        /// Show a progress bar over input files
        #[arg(long)]
        progress: bool,
    },

    /// Score targets against PATTERN and print JSON results
    ///
    /// One target prints a scalar, several print an array in input order.
    Score {
        /// Pattern to score against
        pattern: String,

        /// Target strings
        #[arg(required_unless_present = "json", conflicts_with = "json")]
        targets: Vec<String>,

        /// Targets as a JSON string or array of strings
        #[arg(long)]
        json: Option<String>,

        /// Metric
        #[arg(long, value_enum, default_value = "levenshtein")]
        metric: CliMetric,

        /// Operation [default: the metric's primary score]
        #[arg(long, value_enum)]
        op: Option<CliOperation>,

        /// Field delimiter regex for pair-distance (token set mode)
        #[arg(long)]
        split: Option<String>,

        /// Compare bigrams inside each field for pair-distance; fields are
        /// whitespace separated unless --split is given
        #[arg(long)]
        field_bigrams: bool,

        /// Substitution weight (levenshtein/sellers)
        #[arg(long)]
        substitution: Option<f64>,

        /// Insertion weight (levenshtein/sellers)
        #[arg(long)]
        insertion: Option<f64>,

        /// Deletion weight (levenshtein/sellers)
        #[arg(long)]
        deletion: Option<f64>,
    },

    /// Benchmark edit distance performance
    Benchmark {
        /// Number of iterations per case
        #[arg(long, default_value = "1000")]
        iterations: usize,

        /// Sequence size
        #[arg(long, default_value = "275")]
        size: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Grep {
            pattern,
            files,
            distance,
            relative,
            verbose,
            metric,
            substitution,
            insertion,
            deletion,
            config,
            format,
            spans,
            progress,
        } => {
            init_tracing(verbose);

            // Start with the config file or library defaults
            let mut params = match config {
                Some(path) => ScanParams::from_json_file(&path)?,
                None => ScanParams::default(),
            };

            // Overlay user-specified values
            if let Some(threshold) = distance {
                params.threshold = threshold;
            }
            if relative {
                params.relative = true;
            }
            if let Some(flavor) = metric {
                params.flavor = flavor.into();
            }
            if spans {
                params.with_spans = true;
            }
            for (kind, value) in [
                (WeightKind::Substitution, substitution),
                (WeightKind::Insertion, insertion),
                (WeightKind::Deletion, deletion),
            ] {
                if let Some(value) = value {
                    params.weights.set(kind, value)?;
                }
            }
            params.validate()?;

            let scanner = LineScanner::new(pattern, &params);
            debug!(
                pattern = scanner.matcher().pattern(),
                flavor = ?scanner.matcher().flavor(),
                threshold = scanner.threshold(),
                relative = scanner.is_relative(),
                "scanning"
            );
            let mut out = BufWriter::new(io::stdout().lock());
            let mut emit = |m: &LineMatch| match format {
                OutputFormat::Plain => write_plain(m, &mut out),
                OutputFormat::Json => write_json_line(m, &mut out),
            };

            let summary = if files.is_empty() {
                scanner.scan_reader(io::stdin().lock(), None, &mut emit)?
            } else {
                let scan = scanner.scan_files(&files, progress, &mut emit)?;
                for failure in &scan.failures {
                    eprintln!("amatch: {}", failure);
                }
                scan.summary
            };
            out.flush()?;

            if verbose {
                write_summary(&summary, &mut io::stderr())?;
            }
        }

        Commands::Score {
            pattern,
            mut targets,
            json,
            metric,
            op,
            split,
            field_bigrams,
            substitution,
            insertion,
            deletion,
        } => {
            init_tracing(false);

            let metric = Metric::from(metric);
            let mut matcher = Matcher::new(pattern, metric);

            if split.is_some() || field_bigrams {
                let splitter = match split {
                    Some(delimiter) => FieldSplitter::regex(&delimiter)?,
                    None => FieldSplitter::Whitespace,
                };
                let mode = if field_bigrams {
                    PairMode::FieldBigrams(splitter)
                } else {
                    PairMode::TokenSet(splitter)
                };
                match matcher {
                    Matcher::PairDistance(ref mut m) => m.set_mode(mode),
                    _ => return Err("--split/--field-bigrams only apply to pair-distance".into()),
                }
            }
            for (kind, value) in [
                (WeightKind::Substitution, substitution),
                (WeightKind::Insertion, insertion),
                (WeightKind::Deletion, deletion),
            ] {
                if let Some(value) = value {
                    matcher.set_weight(kind, value)?;
                }
            }

            let op = op.map(Operation::from).unwrap_or_else(|| Operation::primary(metric));
            let unsupported = || format!("{} does not support {:?}", metric, op);

            let result = match json {
                Some(text) => {
                    let value: Value = serde_json::from_str(&text)?;
                    matcher.evaluate_op_json(op, &value)?.ok_or_else(unsupported)?
                }
                None => {
                    let targets = if targets.len() == 1 {
                        Targets::One(targets.remove(0))
                    } else {
                        Targets::Many(targets)
                    };
                    matcher
                        .evaluate_op(op, &targets)
                        .ok_or_else(unsupported)?
                        .to_json()
                }
            };

            write_json(&result, &mut io::stdout().lock())?;
        }

        Commands::Benchmark { iterations, size } => {
            init_tracing(false);
            run_benchmark(iterations, size);
        }
    }

    Ok(())
}

/// Run edit distance benchmark to measure performance.
fn run_benchmark(iterations: usize, size: usize) {
    use amatch::align::{edit_distance, search_distance, EditCosts};
    use std::time::Instant;

    println!("=== Edit Distance Benchmark ===");
    println!("Iterations: {}", iterations);
    println!("Sequence size: {}", size);

    let costs = EditCosts::unit();
    let iterations = iterations.max(1);

    let alphabet: Vec<char> = ('a'..='z').collect();
    let seq_identical: Vec<char> = (0..size).map(|i| alphabet[i % 26]).collect();
    let seq_partial: Vec<char> = (0..size)
        .map(|i| if i % 10 < 7 { alphabet[i % 26] } else { '#' })
        .collect();
    let seq_no_match: Vec<char> = vec!['#'; size];
    let filler = vec!['.'; size * 2];
    let haystack: Vec<char> = filler
        .iter()
        .chain(&seq_partial)
        .chain(&filler)
        .copied()
        .collect();

    let cases: [(&str, &[char], bool); 4] = [
        ("Identical sequences (match)", &seq_identical[..], false),
        ("70% match sequences (match)", &seq_partial[..], false),
        ("No match sequences (match)", &seq_no_match[..], false),
        ("70% match inside haystack (search)", &haystack[..], true),
    ];

    for (label, target, search) in cases {
        println!("\n{}:", label);
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = if search {
                search_distance(&seq_identical, target, &costs)
            } else {
                edit_distance(&seq_identical, target, &costs)
            };
        }
        let elapsed = start.elapsed();
        let per_call = elapsed.as_secs_f64() / iterations as f64;
        println!("  Total time: {:.3}s", elapsed.as_secs_f64());
        println!("  Per call: {:.3}ms", per_call * 1000.0);
        if per_call > 0.0 {
            println!("  Calls/sec: {:.0}", 1.0 / per_call);
        }
    }

    // Same pipeline as `grep` on one line per iteration
    let matcher = amatch::EditDistance::levenshtein(seq_identical.iter().collect::<String>());
    let line: String = haystack.iter().collect();
    let bytes = (line.len() * iterations) as u64;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = matcher.search(&line);
    }
    let summary = amatch::scan::ScanSummary {
        lines: iterations,
        bytes,
        matches: 0,
        elapsed: start.elapsed(),
    };
    println!("\nMatcher search over haystack lines:");
    println!("  {}", format_timing(&summary));
}
