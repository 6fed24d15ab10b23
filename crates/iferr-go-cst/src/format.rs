// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-buffer re-formatting.
//!
//! [`reformat`] checks that a buffer parses, then normalizes its layout the
//! way gofmt lays out statements:
//!
//! - each line is indented with tabs, one level per enclosing bracket whose
//!   opening line is still open; a line starting with a closer sits at its
//!   opener's level
//! - `case`/`default` clauses and labels are outdented one level
//! - a line continuing an expression (previous line ends in a binary or
//!   assignment operator) gets one extra level
//! - trailing whitespace is removed, runs of blank lines collapse to one,
//!   and the buffer ends with exactly one newline
//!
//! Intra-line spacing is left alone, as are the contents of multi-line raw
//! strings and block comments. Unlike gofmt, nothing is column-aligned:
//! `=` in const and var groups, struct field types and trailing comments
//! keep the columns they were written with.

use std::collections::HashSet;

use iferr_core::text::byte_offset_to_position;
use thiserror::Error;
use tracing::debug;

use crate::nodes::{NodeKind, SourceTree};
use crate::parser::parse_file;
use crate::tokenizer::{tokenize, Keyword, Op, TokType, Token, Tokenized};

/// The buffer could not be re-formatted. Carries the buffer itself so the
/// caller can show what was produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("re-formatting failed: {message}")]
pub struct ReformatError {
    pub message: String,
    pub buffer: String,
}

impl ReformatError {
    fn new(message: impl Into<String>, buffer: &str) -> Self {
        ReformatError {
            message: message.into(),
            buffer: buffer.to_string(),
        }
    }
}

/// Re-format a complete Go source buffer.
pub fn reformat(buffer: &str) -> Result<String, ReformatError> {
    let tree = parse_file(buffer).map_err(|e| {
        let (line, col) = byte_offset_to_position(buffer.as_bytes(), e.span().start);
        ReformatError::new(format!("{}:{}: {}", line, col, e), buffer)
    })?;
    let tokenized = tokenize(buffer).map_err(|e| ReformatError::new(e.to_string(), buffer))?;

    let layout = Layout::new(buffer, &tokenized);
    let indents = layout.indents(&label_starts(&tree));
    let formatted = layout.render(&indents);
    debug!(
        lines_in = layout.line_starts.len(),
        lines_out = formatted.lines().count(),
        "re-formatted buffer"
    );
    Ok(formatted)
}

/// Start offsets of statement labels.
fn label_starts(tree: &SourceTree) -> HashSet<usize> {
    let mut labels = HashSet::new();
    tree.walk(tree.root(), &mut |id| {
        if let NodeKind::LabeledStmt { label, .. } = tree.kind(id) {
            labels.insert(tree.span(*label).start);
        }
        true
    });
    labels
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineIndent {
    Blank,
    /// Starts inside a multi-line raw string or block comment.
    Verbatim,
    Code(usize),
    Comment { depth: usize, original: usize },
}

struct Layout<'a> {
    src: &'a str,
    line_starts: Vec<usize>,
    /// Tokens starting on each line, inserted semicolons excluded.
    line_tokens: Vec<Vec<Token>>,
    verbatim: Vec<bool>,
    /// The line's newline is inside a raw string or block comment.
    open_end: Vec<bool>,
}

impl<'a> Layout<'a> {
    fn new(src: &'a str, tokenized: &Tokenized) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            memchr::memchr_iter(b'\n', src.as_bytes())
                .map(|i| i + 1)
                .filter(|&i| i < src.len()),
        );
        let lines = line_starts.len();
        let line_of = |offset: usize| line_starts.partition_point(|&s| s <= offset) - 1;

        let mut line_tokens = vec![Vec::new(); lines];
        for tok in &tokenized.tokens {
            if matches!(tok.typ, TokType::AutoSemi | TokType::Eof) {
                continue;
            }
            line_tokens[line_of(tok.span.start)].push(*tok);
        }

        let mut verbatim = vec![false; lines];
        let mut open_end = vec![false; lines];
        let multi_line = tokenized
            .tokens
            .iter()
            .filter(|t| t.typ == TokType::String)
            .map(|t| t.span)
            .chain(tokenized.comments.iter().filter(|c| c.block).map(|c| c.span))
            .filter(|span| src[span.start..span.end].contains('\n'));
        for span in multi_line {
            let first = line_of(span.start);
            let last = line_of(span.end.saturating_sub(1));
            for line in first + 1..=last {
                verbatim[line] = true;
            }
            for flag in &mut open_end[first..last] {
                *flag = true;
            }
        }

        Layout {
            src,
            line_starts,
            line_tokens,
            verbatim,
            open_end,
        }
    }

    fn line_text(&self, line: usize) -> &'a str {
        let start = self.line_starts[line];
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => next - 1,
            // The buffer's final newline belongs to no line.
            None => self.src.len() - usize::from(self.src.ends_with('\n')),
        };
        &self.src[start..end.max(start)]
    }

    fn indents(&self, labels: &HashSet<usize>) -> Vec<LineIndent> {
        // Logical indentation of the line holding each open bracket.
        let mut stack: Vec<usize> = Vec::new();
        let mut continues = false;
        let mut indents = Vec::with_capacity(self.line_starts.len());

        for (line, toks) in self.line_tokens.iter().enumerate() {
            let depth = stack.last().map(|base| base + 1).unwrap_or(0);
            let first = toks.first().copied();
            let starts_with_closer =
                matches!(first.map(|t| t.typ), Some(TokType::Op(op)) if op.is_closer());
            let logical = if starts_with_closer {
                stack.last().copied().unwrap_or(0)
            } else {
                depth
            };

            let text = self.line_text(line);
            let trimmed = text.trim_start();
            let indent = if self.verbatim[line] {
                LineIndent::Verbatim
            } else if trimmed.trim_end().is_empty() {
                LineIndent::Blank
            } else if first.is_none() {
                // Nothing but comments on this line.
                LineIndent::Comment {
                    depth,
                    original: original_level(text),
                }
            } else {
                let mut indent = logical;
                if let Some(tok) = first {
                    let clause = matches!(
                        tok.typ,
                        TokType::Keyword(Keyword::Case) | TokType::Keyword(Keyword::Default)
                    );
                    if clause || labels.contains(&tok.span.start) {
                        indent = indent.saturating_sub(1);
                    }
                }
                if continues && !starts_with_closer {
                    indent += 1;
                }
                LineIndent::Code(indent)
            };
            indents.push(indent);

            for tok in toks {
                match tok.typ {
                    TokType::Op(op) if op.is_opener() => stack.push(logical),
                    TokType::Op(op) if op.is_closer() => {
                        stack.pop();
                    }
                    _ => {}
                }
            }
            if let Some(last) = toks.last() {
                continues = is_continuation(last.typ);
            }
        }

        self.settle_comments(&mut indents);
        indents
    }

    /// A comment line directly above a `case`, `default` or closing bracket
    /// that was written at that line's level stays there instead of taking
    /// the deeper body indentation.
    fn settle_comments(&self, indents: &mut [LineIndent]) {
        for line in 0..indents.len() {
            let LineIndent::Comment { depth, original } = indents[line] else {
                continue;
            };
            let next_code = (line + 1..indents.len()).find_map(|l| match indents[l] {
                LineIndent::Code(n) => Some((l, n)),
                _ => None,
            });
            let outdented = next_code.and_then(|(l, n)| {
                let first = self.line_tokens[l].first()?;
                let lowers = match first.typ {
                    TokType::Keyword(Keyword::Case) | TokType::Keyword(Keyword::Default) => true,
                    TokType::Op(op) => op.is_closer(),
                    _ => false,
                };
                (lowers && n < depth && original <= n).then_some(n)
            });
            indents[line] = LineIndent::Code(outdented.unwrap_or(depth));
        }
    }

    fn render(&self, indents: &[LineIndent]) -> String {
        let mut lines: Vec<Option<String>> = Vec::with_capacity(indents.len());
        for (line, indent) in indents.iter().enumerate() {
            let text = self.line_text(line);
            match *indent {
                LineIndent::Blank => lines.push(None),
                LineIndent::Verbatim => lines.push(Some(text.to_string())),
                LineIndent::Code(n) | LineIndent::Comment { depth: n, .. } => {
                    let mut body = text.trim_start();
                    if !self.open_end[line] {
                        body = body.trim_end();
                    }
                    lines.push(Some(format!("{}{}", "\t".repeat(n), body)));
                }
            }
        }

        let mut out = String::with_capacity(self.src.len());
        let mut pending_blank = false;
        for line in lines {
            match line {
                None => pending_blank = !out.is_empty(),
                Some(text) => {
                    if pending_blank {
                        out.push('\n');
                        pending_blank = false;
                    }
                    out.push_str(&text);
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Previous line's last token means the next line continues its
/// expression.
fn is_continuation(typ: TokType) -> bool {
    match typ {
        TokType::Op(op) => {
            op.precedence() > 0 || op.is_assign() || matches!(op, Op::Dot | Op::Arrow)
        }
        _ => false,
    }
}

/// Indentation level of a line as written, counting a tab or eight spaces
/// as one level.
fn original_level(text: &str) -> usize {
    let mut columns = 0;
    for c in text.chars() {
        match c {
            '\t' => columns = (columns / 8 + 1) * 8,
            ' ' => columns += 1,
            _ => break,
        }
    }
    columns / 8
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(src: &str) -> String {
        reformat(src).unwrap_or_else(|e| panic!("{}\n{}", e, e.buffer))
    }

    mod indentation {
        use super::*;

        #[test]
        fn body_reindented_from_brackets() {
            let src = "package p\n\nfunc f() (int, error) {\nif err := g(); err != nil {\n        return 0, err\n}\n  return 1, nil\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f() (int, error) {\n\tif err := g(); err != nil {\n\t\treturn 0, err\n\t}\n\treturn 1, nil\n}\n"
            );
        }

        #[test]
        fn case_and_default_outdented() {
            let src = "package p\n\nfunc f(x int) {\nswitch x {\ncase 1:\ng()\ndefault:\n}\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f(x int) {\n\tswitch x {\n\tcase 1:\n\t\tg()\n\tdefault:\n\t}\n}\n"
            );
        }

        #[test]
        fn labels_outdented() {
            let src = "package p\n\nfunc f() {\n\touter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n"
            );
        }

        #[test]
        fn continuation_lines() {
            let src = "package p\n\nfunc f() bool {\nreturn a &&\nb\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f() bool {\n\treturn a &&\n\t\tb\n}\n"
            );
        }

        #[test]
        fn call_arguments_and_closers() {
            let src = "package p\n\nfunc f() {\ng(a,\nfunc() {\nh()\n})\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f() {\n\tg(a,\n\t\tfunc() {\n\t\t\th()\n\t\t})\n}\n"
            );
        }

        #[test]
        fn comments_follow_code() {
            let src = "package p\n\nfunc f(x int) {\n// leading\nswitch x {\n\t\t// in body\ncase 1:\n\tg()\n// before default\ndefault:\n}\n}\n";
            assert_eq!(
                fmt(src),
                "package p\n\nfunc f(x int) {\n\t// leading\n\tswitch x {\n\t\t// in body\n\tcase 1:\n\t\tg()\n\t// before default\n\tdefault:\n\t}\n}\n"
            );
        }
    }

    mod whitespace {
        use super::*;

        #[test]
        fn blank_runs_collapse_and_single_trailing_newline() {
            let src = "\n\npackage p   \n\n\n\nfunc f() {}\n\n\n";
            assert_eq!(fmt(src), "package p\n\nfunc f() {}\n");
        }

        #[test]
        fn trailing_comment_kept() {
            let src = "package p\n\nfunc f() {\n\tif err := g(); err != nil {\n\t\treturn\n\t} // delete\n}\n";
            assert_eq!(fmt(src), src);
        }

        #[test]
        fn raw_strings_untouched() {
            let src = "package p\n\nvar s = `first   \n   second\n\n\n  third`\n";
            assert_eq!(fmt(src), src);
        }

        #[test]
        fn raw_string_closing_the_buffer_ends_with_one_newline() {
            let src = "package p\n\nvar s = `a\n  b`\n\n\n";
            assert_eq!(fmt(src), "package p\n\nvar s = `a\n  b`\n");
        }

        #[test]
        fn block_comment_contents_untouched() {
            let src = "package p\n\n/*\n   keep   \n      this\n*/\nfunc f() {}\n";
            assert_eq!(fmt(src), src);
        }

        #[test]
        fn column_alignment_is_kept_as_written() {
            let aligned = "package p\n\nconst (\n\ta      = 1\n\tlonger = 2\n)\n\ntype t struct {\n\ta      int    // first\n\tlonger string // second\n}\n";
            assert_eq!(fmt(aligned), aligned);

            let ragged = "package p\n\nconst (\n\ta = 1\n\tlonger = 2\n)\n\ntype t struct {\n\ta int // first\n\tlonger string // second\n}\n";
            assert_eq!(fmt(ragged), ragged);
        }

        #[test]
        fn formatted_input_is_stable() {
            let src = "package main\n\nimport (\n\t\"io\"\n\t\"os\"\n)\n\n// copy copies.\nfunc copyAll(dst io.Writer) (int64, error) {\n\tf, err := os.Open(\"/tmp/a\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\tdefer f.Close()\n\n\tx := map[string]int{\n\t\t\"a\": 1,\n\t}\n\t_ = x\n\treturn io.Copy(dst, f)\n}\n";
            assert_eq!(fmt(src), src);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn parse_failure_carries_buffer() {
            let src = "package p\n\nfunc f() {\n\tif x {\n}\n";
            let err = reformat(src).unwrap_err();
            assert_eq!(err.buffer, src);
            assert!(err.message.starts_with("6:1:"), "{}", err.message);
        }
    }
}
