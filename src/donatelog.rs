//! Donation log merge: keep the pasted lines dated at or after the cutoff.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::config::DONATION_FORMAT;
use crate::error::MergeError;
use crate::timestamp::parse_exact;

/// One data line of a pasted donation log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PastedLine<'a> {
    /// Trimmed source line; this is what gets merged.
    pub raw: &'a str,
    pub timestamp: NaiveDateTime,
    pub fields: Vec<&'a str>,
}

/// Splits on tabs, or on runs of four spaces when the line has no tab. Fields are trimmed, empty
/// ones dropped, and one pair of surrounding double quotes removed.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = line.split('\t').collect();
    if parts.len() == 1 {
        parts = line.split("    ").collect();
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(strip_quotes)
        .collect()
}

fn strip_quotes(field: &str) -> &str {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}

/// Parses one pasted line. Returns `None` for blank lines, the header row, and lines whose first
/// field is not a `MM/DD/YYYY HH:MM:SS` timestamp.
pub fn parse_pasted_line<'a>(line: &'a str, header: &str) -> Option<PastedLine<'a>> {
    let raw = line.trim();
    if raw.is_empty() || raw == header {
        return None;
    }
    let fields = split_fields(raw);
    let first = fields.first()?;
    let timestamp = parse_exact(first, DONATION_FORMAT)?;
    Some(PastedLine {
        raw,
        timestamp,
        fields,
    })
}

/// Line boundaries of a paste: `\n`, `\r`, vertical tab, form feed, the file/group/record
/// separators, NEL and the Unicode line and paragraph separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Lines of `text` dated at or after `cutoff`, trimmed, in input order.
pub fn filter_pasted_text<'a>(text: &'a str, cutoff: NaiveDateTime, header: &str) -> Vec<&'a str> {
    let mut kept = Vec::new();
    let mut skipped = 0usize;
    for line in text.split(is_line_break) {
        match parse_pasted_line(line, header) {
            Some(parsed) if parsed.timestamp >= cutoff => kept.push(parsed.raw),
            Some(parsed) => {
                skipped += 1;
                trace!(line = parsed.raw, fields = parsed.fields.len(), "before cutoff");
            }
            None => {}
        }
    }
    debug!(kept = kept.len(), before_cutoff = skipped, "filtered donation log");
    kept
}

/// Writes one line per entry with a trailing newline, overwriting `path`.
pub fn write_merged(lines: &[&str], path: &Path) -> Result<(), MergeError> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| MergeError::io(path, e))
}
