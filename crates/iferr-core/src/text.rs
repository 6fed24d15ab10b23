//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes, not characters, matching how Go tooling reports
//!   positions
//! - Line/column values of 0 are treated as 1

use crate::patch::Span;

// ============================================================================
// Byte-based Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert 1-indexed line and column to byte offset.
///
/// Returns `None` if the line does not exist. A column past the end of the
/// line is clamped to the line's end.
pub fn position_to_byte_offset(content: &[u8], line: u32, col: u32) -> Option<usize> {
    let start = line_start_offset(content, line.max(1))?;
    let line_end = content[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| start + p)
        .unwrap_or(content.len());
    let offset_in_line = (col.max(1) as usize) - 1;
    Some(start + offset_in_line.min(line_end - start))
}

// ============================================================================
// Span Utilities
// ============================================================================

/// Get the line range spanned by a byte span.
///
/// Returns `(start_line, end_line)` both 1-indexed.
pub fn span_to_line_range(content: &[u8], span: &Span) -> (u32, u32) {
    let (start_line, _) = byte_offset_to_position(content, span.start);
    let (end_line, _) =
        byte_offset_to_position(content, span.end.saturating_sub(1).max(span.start));
    (start_line, end_line)
}

/// Extract the text content of a span as a string.
///
/// Returns `None` if the span extends beyond content bounds or splits a
/// UTF-8 sequence.
pub fn extract_span_str<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Get the byte offset of the start of a 1-indexed line.
///
/// The line after a trailing newline exists (it is empty), so
/// `line_start_offset(b"a\n", 2) == Some(2)`.
pub fn line_start_offset(content: &[u8], line: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }
    if line == 1 {
        return Some(0);
    }

    let mut current_line = 1u32;
    for (i, &byte) in content.iter().enumerate() {
        if byte == b'\n' {
            current_line += 1;
            if current_line == line {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Byte span of the 1-indexed line containing `offset`, excluding the newline.
pub fn line_span_at(content: &[u8], offset: usize) -> Span {
    let offset = offset.min(content.len());
    let start = content[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    let end = content[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| offset + p)
        .unwrap_or(content.len());
    Span::new(start, end)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod byte_based_tests {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = b"line1\nline2\nline3\n";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 4), (1, 5));
            assert_eq!(byte_offset_to_position(content, 5), (1, 6)); // newline char
            assert_eq!(byte_offset_to_position(content, 6), (2, 1));
            assert_eq!(byte_offset_to_position(content, 12), (3, 1));
        }

        #[test]
        fn offset_past_end_clamps() {
            let content = b"ab\ncd";
            assert_eq!(byte_offset_to_position(content, 100), (2, 3));
        }

        #[test]
        fn position_to_offset_simple() {
            let content = b"line1\nline2\nline3\n";
            assert_eq!(position_to_byte_offset(content, 1, 1), Some(0));
            assert_eq!(position_to_byte_offset(content, 1, 5), Some(4));
            assert_eq!(position_to_byte_offset(content, 2, 1), Some(6));
            assert_eq!(position_to_byte_offset(content, 3, 1), Some(12));
        }

        #[test]
        fn position_to_offset_clamps_column() {
            let content = b"ab\ncdef\n";
            assert_eq!(position_to_byte_offset(content, 1, 40), Some(2));
        }

        #[test]
        fn position_to_offset_missing_line() {
            assert_eq!(position_to_byte_offset(b"ab\ncd", 7, 1), None);
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn single_line_span() {
            let content = b"aa\nbbbb\ncc\n";
            assert_eq!(span_to_line_range(content, &Span::new(3, 7)), (2, 2));
        }

        #[test]
        fn multi_line_span() {
            let content = b"aa\nbbbb\ncc\n";
            assert_eq!(span_to_line_range(content, &Span::new(1, 10)), (1, 3));
        }

        #[test]
        fn span_ending_after_newline_stays_on_line() {
            let content = b"aa\nbbbb\ncc\n";
            assert_eq!(span_to_line_range(content, &Span::new(3, 8)), (2, 2));
        }

        #[test]
        fn extract() {
            assert_eq!(extract_span_str("hello world", &Span::new(6, 11)), Some("world"));
            assert_eq!(extract_span_str("hi", &Span::new(0, 3)), None);
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn line_starts() {
            let content = b"a\nbc\n";
            assert_eq!(line_start_offset(content, 0), None);
            assert_eq!(line_start_offset(content, 1), Some(0));
            assert_eq!(line_start_offset(content, 2), Some(2));
            assert_eq!(line_start_offset(content, 3), Some(5));
            assert_eq!(line_start_offset(content, 4), None);
        }

        #[test]
        fn line_span() {
            let content = b"a\nbcd\ne";
            assert_eq!(line_span_at(content, 3), Span::new(2, 5));
            assert_eq!(line_span_at(content, 0), Span::new(0, 1));
            assert_eq!(line_span_at(content, 7), Span::new(6, 7));
        }
    }
}
