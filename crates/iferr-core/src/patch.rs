//! Byte spans, content hashes and line-based edits.
//!
//! An expansion is a single edit: one contiguous byte range of the original
//! file (the subject) is replaced and the whole buffer is re-formatted. For
//! editor integration the result is described as a [`LineEdit`], a
//! replacement of whole lines, which is what the JSON output carries.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }

    /// Check whether `data` still hashes to this value.
    pub fn matches(&self, data: &[u8]) -> bool {
        *self == ContentHash::compute(data)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Line Edits
// ============================================================================

/// A replacement of whole lines: lines `start_line..=end_line` (1-indexed) of
/// the original are replaced by `replacement_lines`.
///
/// Lines are obtained by splitting on `\n`, so a file ending in a newline has
/// a final empty "line". `end_line == start_line - 1` denotes a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    pub start_line: u32,
    pub end_line: u32,
    pub replacement_lines: Vec<String>,
}

impl LineEdit {
    /// Describe how `formatted` differs from `original` as a line edit.
    ///
    /// The edit covers at least the lines `subject_lines` of the original.
    /// When re-formatting changed lines outside the subject the range is
    /// widened until the edit reproduces `formatted` exactly.
    pub fn between(original: &str, formatted: &str, subject_lines: (u32, u32)) -> LineEdit {
        let old: Vec<&str> = original.split('\n').collect();
        let new: Vec<&str> = formatted.split('\n').collect();

        let common_prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let common_suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let subject_start = (subject_lines.0.max(1) as usize).min(old.len());
        let subject_end = (subject_lines.1 as usize).clamp(subject_start - 1, old.len());

        let head = (subject_start - 1).min(common_prefix);
        let tail = (old.len() - subject_end)
            .min(common_suffix)
            .min(old.len() - head)
            .min(new.len() - head);

        LineEdit {
            start_line: (head + 1) as u32,
            end_line: (old.len() - tail) as u32,
            replacement_lines: new[head..new.len() - tail]
                .iter()
                .map(|line| line.to_string())
                .collect(),
        }
    }

    /// Apply the edit to `original`, returning the edited text.
    pub fn apply(&self, original: &str) -> String {
        let old: Vec<&str> = original.split('\n').collect();
        let head = (self.start_line.max(1) as usize - 1).min(old.len());
        let tail = (self.end_line as usize).clamp(head, old.len());

        let mut lines: Vec<&str> = Vec::with_capacity(old.len() + self.replacement_lines.len());
        lines.extend_from_slice(&old[..head]);
        lines.extend(self.replacement_lines.iter().map(String::as_str));
        lines.extend_from_slice(&old[tail..]);
        lines.join("\n")
    }
}

// ============================================================================
// Tests
// ============================================================================
