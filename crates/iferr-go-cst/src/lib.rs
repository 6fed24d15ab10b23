// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Go parser and syntax tree library.
//!
//! This crate provides the syntactic layer used by `iferr`: a tokenizer
//! with automatic semicolon insertion, an arena syntax tree with byte spans
//! on every node, a renderer producing gofmt-spaced text, and a whole-buffer
//! re-formatter.
//!
//! # Quick Start
//!
//! ```
//! use iferr_go_cst::{parse_file, path_enclosing_interval, NodeKind};
//!
//! let source = "package p\n\nfunc f() error {\n\treturn g()\n}\n";
//! let tree = parse_file(source).expect("parse error");
//! let offset = source.find("g()").unwrap();
//! let lookup = path_enclosing_interval(&tree, offset, offset).unwrap();
//! assert!(matches!(tree.kind(lookup.path[0]), NodeKind::Ident { .. }));
//! ```

use std::cmp::min;

// ============================================================================
// Public modules and re-exports
// ============================================================================

pub mod codegen;
pub mod format;
pub mod nodes;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use codegen::{Codegen, CodegenState, NodeRef};
pub use format::{reformat, ReformatError};
pub use nodes::{ArrayLen, ChanDir, DeclKeyword, LitKind, Node, NodeId, NodeKind, SourceTree, Span};
pub use parser::{parse_file, ParserError};
pub use tokenizer::{Keyword, Op, TokError};
pub use visitor::{path_enclosing_interval, NodePath};

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth(n - 2)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Formats a parser error into a human-readable string with source context.
///
/// `label` names the input, usually its path. One line of context is shown
/// on each side of the error.
pub fn prettify_error(err: &ParserError, source: &str, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};
    use iferr_core::text::byte_offset_to_position;

    let span = err.span();
    let (line, _) = byte_offset_to_position(source.as_bytes(), span.start);
    let (end_line, _) = byte_offset_to_position(source.as_bytes(), span.end);
    let line = line as usize;
    let end_line = end_line as usize;

    let context = 1;
    let line_start = line.saturating_sub(context).max(1);
    let start_offset = bol_offset(source, line_start);
    let end_offset = bol_offset(source, end_line + context + 1);
    let snippet = &source[start_offset..end_offset];
    let start = span.start - start_offset;
    let end = span.end - start_offset;
    let end = if start == end {
        min(end + 1, snippet.len())
    } else {
        end
    };
    let message = err.to_string();
    let rendered = Renderer::plain()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(snippet)
                    .line_start(line_start)
                    .fold(false)
                    .annotations(vec![Level::Error.span(start..end).label(&message)]),
            ),
        )
        .to_string();
    rendered
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bol_offset() {
        let src = "a\nbc\nd";
        assert_eq!(bol_offset(src, 1), 0);
        assert_eq!(bol_offset(src, 2), 2);
        assert_eq!(bol_offset(src, 3), 5);
        assert_eq!(bol_offset(src, 9), src.len());
    }

    #[test]
    fn test_prettify_error_shows_location() {
        let src = "package p\n\nfunc f() {\n\tx := )\n}\n";
        let err = parse_file(src).unwrap_err();
        let pretty = prettify_error(&err, src, "bad.go");
        assert!(pretty.contains("bad.go"), "{}", pretty);
        assert!(pretty.contains("x := )"), "{}", pretty);
        assert!(pretty.contains("expected expression"), "{}", pretty);
    }

    #[test]
    fn test_prettify_error_at_eof() {
        let src = "package p\n\nfunc f() {";
        let err = parse_file(src).unwrap_err();
        let pretty = prettify_error(&err, src, "eof.go");
        assert!(pretty.contains("eof.go"), "{}", pretty);
    }
}
