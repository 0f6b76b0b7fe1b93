//! Output formatting for scan matches, summaries and score results.

use crate::scan::{LineMatch, ScanSummary};
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Format a match the way `grep` does: `FILE:` prefix when known, then an
/// optional `start..end:` span in symbols, then the line.
pub fn format_match(m: &LineMatch) -> String {
    let mut out = String::new();
    if let Some(ref source) = m.source {
        out.push_str(source);
        out.push(':');
    }
    if let Some(span) = m.span {
        out.push_str(&format!("{}..{}:", span.start, span.end));
    }
    out.push_str(&m.line);
    out
}

/// Write one match as a plain text line.
pub fn write_plain<W: Write>(m: &LineMatch, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", format_match(m))
}

/// Write one match as a single JSON line.
pub fn write_json_line<W: Write>(m: &LineMatch, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, m).map_err(io::Error::from)?;
    writer.write_all(b"\n")
}

/// Write any serializable value as pretty JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Timing diagnostic printed by `grep --verbose`.
pub fn format_timing(summary: &ScanSummary) -> String {
    format!(
        "{:.3} secs running, scanned {:.3} KB/s.",
        summary.elapsed_secs(),
        summary.kb_per_sec()
    )
}

pub fn write_summary<W: Write>(summary: &ScanSummary, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "\n=== Scan Summary ===")?;
    writeln!(writer, "Lines scanned: {}", summary.lines)?;
    writeln!(writer, "Bytes scanned: {}", summary.bytes)?;
    writeln!(writer, "Matching lines: {}", summary.matches)?;
    writeln!(writer, "{}", format_timing(summary))
}
