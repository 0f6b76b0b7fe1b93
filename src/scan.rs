//! Line filter over text streams.
//!
//! Each line is scored against one edit matcher with `search` (or
//! `search_ratio` in relative mode); lines scoring at or below the threshold
//! are handed to the caller in input order.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::align::SearchHit;
use crate::matcher::EditDistance;
use crate::models::ScanParams;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("read error: {0}")]
    Read(io::Error),
    #[error("write error: {0}")]
    Emit(io::Error),
}

/// A line that passed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>, // File the line came from; None for stdin
    pub line_number: usize,     // 1-based
    pub line: String,           // Without its terminator
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SearchHit>,
}

/// Counters for one or more scanned streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub lines: usize,
    pub bytes: u64,
    pub matches: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Input throughput; zero when no time was measured.
    pub fn kb_per_sec(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.bytes as f64 / 1024.0 / secs
        } else {
            0.0
        }
    }

    pub fn absorb(&mut self, other: &ScanSummary) {
        self.lines += other.lines;
        self.bytes += other.bytes;
        self.matches += other.matches;
        self.elapsed += other.elapsed;
    }
}

/// Outcome of scanning several files. Unreadable files do not stop the scan.
#[derive(Debug, Default)]
pub struct FileScan {
    pub summary: ScanSummary,
    pub failures: Vec<ScanError>,
}

/// One edit matcher plus the threshold rule.
#[derive(Debug, Clone)]
pub struct LineScanner {
    matcher: EditDistance,
    threshold: f64,
    relative: bool,
    with_spans: bool,
}

impl LineScanner {
    pub fn new(pattern: impl Into<String>, params: &ScanParams) -> Self {
        let matcher = EditDistance::new(pattern, params.flavor).with_weights(params.weights);
        Self {
            matcher,
            threshold: params.threshold,
            relative: params.relative,
            with_spans: params.with_spans,
        }
    }

    pub fn from_matcher(matcher: EditDistance, threshold: f64, relative: bool) -> Self {
        Self {
            matcher,
            threshold,
            relative,
            with_spans: false,
        }
    }

    pub fn with_spans(mut self, with_spans: bool) -> Self {
        self.with_spans = with_spans;
        self
    }

    pub fn matcher(&self) -> &EditDistance {
        &self.matcher
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// Score used for filtering.
    #[inline]
    pub fn score(&self, line: &str) -> f64 {
        if self.relative {
            self.matcher.search_ratio(line)
        } else {
            self.matcher.search(line)
        }
    }

    pub fn accepts(&self, line: &str) -> bool {
        self.score(line) <= self.threshold
    }

    fn check(&self, line: &str) -> Option<(f64, Option<SearchHit>)> {
        let score = self.score(line);
        if score > self.threshold {
            return None;
        }
        let span = self.with_spans.then(|| self.matcher.locate(line));
        Some((score, span))
    }

    /// Filter an in-memory sequence of lines.
    pub fn scan_lines<I, S>(&self, lines: I) -> Vec<LineMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let line = line.as_ref();
                self.check(line).map(|(score, span)| LineMatch {
                    source: None,
                    line_number: i + 1,
                    line: line.to_string(),
                    score,
                    span,
                })
            })
            .collect()
    }

    /// Scan a byte stream line by line.
    ///
    /// Terminators (`\n`, `\r\n`) are stripped before scoring. Invalid UTF-8
    /// is replaced rather than rejected. `on_match` errors abort the scan.
    pub fn scan_reader<R, F>(
        &self,
        mut reader: R,
        source: Option<&str>,
        mut on_match: F,
    ) -> Result<ScanSummary, ScanError>
    where
        R: BufRead,
        F: FnMut(&LineMatch) -> io::Result<()>,
    {
        let start = Instant::now();
        let mut summary = ScanSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(ScanError::Read)?;
            if read == 0 {
                break;
            }
            summary.lines += 1;
            summary.bytes += read as u64;

            let text = String::from_utf8_lossy(strip_terminator(&buf));
            if let Some((score, span)) = self.check(&text) {
                summary.matches += 1;
                trace!(line = summary.lines, score, "line matched");
                let hit = LineMatch {
                    source: source.map(str::to_string),
                    line_number: summary.lines,
                    line: text.into_owned(),
                    score,
                    span,
                };
                on_match(&hit).map_err(ScanError::Emit)?;
            }
        }

        summary.elapsed = start.elapsed();
        debug!(
            source = source.unwrap_or("-"),
            lines = summary.lines,
            matches = summary.matches,
            bytes = summary.bytes,
            "scan finished"
        );
        Ok(summary)
    }

    /// Scan a single file, tagging matches with its displayed path.
    pub fn scan_file<F>(&self, path: &Path, on_match: F) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&LineMatch) -> io::Result<()>,
    {
        let file = File::open(path).map_err(|source| ScanError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let display = path.display().to_string();
        self.scan_reader(BufReader::new(file), Some(&display), on_match)
            .map_err(|e| match e {
                ScanError::Read(source) => ScanError::File {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })
    }

    /// Scan files in order. Files that cannot be opened or read are recorded
    /// in [`FileScan::failures`] and skipped; an `on_match` error aborts.
    pub fn scan_files<F>(
        &self,
        paths: &[PathBuf],
        show_progress: bool,
        mut on_match: F,
    ) -> Result<FileScan, ScanError>
    where
        F: FnMut(&LineMatch) -> io::Result<()>,
    {
        let progress = if show_progress {
            let pb = ProgressBar::new(paths.len() as u64);
            let style = ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            Some(pb)
        } else {
            None
        };

        let mut scan = FileScan::default();
        for path in paths {
            match self.scan_file(path, &mut on_match) {
                Ok(summary) => scan.summary.absorb(&summary),
                Err(e @ ScanError::Emit(_)) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "skipping file");
                    scan.failures.push(e);
                }
            }
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Done");
        }

        Ok(scan)
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
