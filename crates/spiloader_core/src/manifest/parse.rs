//! Manifest line-format parsing.
//!
//! # Invariants
//! - Line numbers are 1-based and refer to the raw file content.
//! - `#` starts a comment anywhere on a line; what remains is trimmed.
//! - A leading UTF-8 byte order mark is ignored.
//! - Parsing never drops a malformed line silently: each one is reported in
//!   order next to the well-formed entries.

use crate::contract::id::{IdentifierError, ProviderId};

/// Comment marker for manifest lines.
pub const COMMENT_MARKER: char = '#';

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One well-formed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub line: usize,
    pub provider: ProviderId,
}

/// One malformed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub line: usize,
    pub content: String,
    pub reason: IdentifierError,
}

/// Parses manifest text into ordered line outcomes.
///
/// Blank and comment-only lines produce nothing.
pub fn parse_manifest(content: &str) -> Vec<Result<ManifestEntry, MalformedLine>> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    content
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| parse_line(index + 1, raw))
        .collect()
}

fn parse_line(line: usize, raw: &str) -> Option<Result<ManifestEntry, MalformedLine>> {
    let without_comment = match raw.find(COMMENT_MARKER) {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let trimmed = without_comment.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(
        ProviderId::parse(trimmed)
            .map(|provider| ManifestEntry { line, provider })
            .map_err(|reason| MalformedLine {
                line,
                content: trimmed.to_string(),
                reason,
            }),
    )
}
