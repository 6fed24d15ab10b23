// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::tokenizer::{tokenize, Keyword, Op, TokType};

fn tokenize_all(text: &str) -> Vec<(TokType, &str)> {
    let tokenized = tokenize(text).expect("tokenize");
    let mut result: Vec<(TokType, &str)> = tokenized
        .tokens
        .iter()
        .map(|t| (t.typ, &text[t.span.start..t.span.end]))
        .collect();
    // Remove the Eof, since it's on every token stream.
    assert_eq!(result.pop().expect("Eof").0, TokType::Eof);
    result
}

fn types(text: &str) -> Vec<TokType> {
    tokenize_all(text).into_iter().map(|(t, _)| t).collect()
}

#[test]
fn test_identifiers_and_keywords() {
    assert_eq!(
        tokenize_all("func main"),
        vec![
            (TokType::Keyword(Keyword::Func), "func"),
            (TokType::Ident, "main"),
            (TokType::AutoSemi, ""),
        ]
    );
    assert_eq!(
        tokenize_all("_under héllo"),
        vec![
            (TokType::Ident, "_under"),
            (TokType::Ident, "héllo"),
            (TokType::AutoSemi, ""),
        ]
    );
}

#[test]
fn test_semicolon_after_call_on_newline() {
    assert_eq!(
        types("f(x)\ng()"),
        vec![
            TokType::Ident,
            TokType::Op(Op::LParen),
            TokType::Ident,
            TokType::Op(Op::RParen),
            TokType::AutoSemi,
            TokType::Ident,
            TokType::Op(Op::LParen),
            TokType::Op(Op::RParen),
            TokType::AutoSemi,
        ]
    );
}

#[test]
fn test_no_semicolon_after_operator() {
    assert_eq!(
        types("a +\nb"),
        vec![
            TokType::Ident,
            TokType::Op(Op::Plus),
            TokType::Ident,
            TokType::AutoSemi,
        ]
    );
    assert_eq!(
        types("{\n}"),
        vec![
            TokType::Op(Op::LBrace),
            TokType::Op(Op::RBrace),
            TokType::AutoSemi,
        ]
    );
}

#[test]
fn test_semicolon_after_return_keyword() {
    assert_eq!(
        types("return\n"),
        vec![TokType::Keyword(Keyword::Return), TokType::AutoSemi]
    );
}

#[test]
fn test_line_comment_then_newline_inserts_semicolon() {
    let tokenized = tokenize("x // trailing\ny").unwrap();
    assert_eq!(tokenized.comments.len(), 1);
    assert!(!tokenized.comments[0].block);
    let typs: Vec<_> = tokenized.tokens.iter().map(|t| t.typ).collect();
    assert_eq!(
        typs,
        vec![
            TokType::Ident,
            TokType::AutoSemi,
            TokType::Ident,
            TokType::AutoSemi,
            TokType::Eof,
        ]
    );
    // The inserted semicolon sits at the newline, after the comment.
    assert_eq!(tokenized.tokens[1].span.start, 13);
}

#[test]
fn test_block_comment_spanning_newline_acts_as_newline() {
    let tokenized = tokenize("x /* a\nb */ y").unwrap();
    let typs: Vec<_> = tokenized.tokens.iter().map(|t| t.typ).collect();
    assert_eq!(
        typs,
        vec![
            TokType::Ident,
            TokType::AutoSemi,
            TokType::Ident,
            TokType::AutoSemi,
            TokType::Eof,
        ]
    );
    assert!(tokenized.comments[0].block);
}

#[test]
fn test_inline_block_comment_is_not_a_newline() {
    assert_eq!(
        types("f(\"a\" /*path*/)"),
        vec![
            TokType::Ident,
            TokType::Op(Op::LParen),
            TokType::String,
            TokType::Op(Op::RParen),
            TokType::AutoSemi,
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokenize_all("0 42 0x1F 0b101 0o17 1_000 3.14 .5 1e9 2.5E-3 0x1p4 3i 0.0"),
        vec![
            (TokType::Int, "0"),
            (TokType::Int, "42"),
            (TokType::Int, "0x1F"),
            (TokType::Int, "0b101"),
            (TokType::Int, "0o17"),
            (TokType::Int, "1_000"),
            (TokType::Float, "3.14"),
            (TokType::Float, ".5"),
            (TokType::Float, "1e9"),
            (TokType::Float, "2.5E-3"),
            (TokType::Float, "0x1p4"),
            (TokType::Imag, "3i"),
            (TokType::Float, "0.0"),
            (TokType::AutoSemi, ""),
        ]
    );
}

#[test]
fn test_strings_and_runes() {
    assert_eq!(
        tokenize_all(r#""a\"b" `raw
line` 'x' '\n'"#),
        vec![
            (TokType::String, r#""a\"b""#),
            (TokType::String, "`raw\nline`"),
            (TokType::Char, "'x'"),
            (TokType::Char, r"'\n'"),
            (TokType::AutoSemi, ""),
        ]
    );
}

#[test]
fn test_longest_operator_match() {
    assert_eq!(
        tokenize_all("a &^= b <<= c := d ... <-ch"),
        vec![
            (TokType::Ident, "a"),
            (TokType::Op(Op::AmpCaretAssign), "&^="),
            (TokType::Ident, "b"),
            (TokType::Op(Op::ShlAssign), "<<="),
            (TokType::Ident, "c"),
            (TokType::Op(Op::Define), ":="),
            (TokType::Ident, "d"),
            (TokType::Op(Op::Ellipsis), "..."),
            (TokType::Op(Op::Arrow), "<-"),
            (TokType::Ident, "ch"),
            (TokType::AutoSemi, ""),
        ]
    );
}

#[test]
fn test_errors() {
    assert_eq!(
        tokenize("\"abc\n\"").unwrap_err().message,
        "string literal not terminated"
    );
    assert_eq!(
        tokenize("/* never closed").unwrap_err().message,
        "comment not terminated"
    );
    assert_eq!(tokenize("a $ b").unwrap_err().offset, 2);
}

#[test]
fn test_op_metadata() {
    assert_eq!(Op::AndAnd.precedence(), 2);
    assert_eq!(Op::AmpCaret.precedence(), 5);
    assert_eq!(Op::Define.precedence(), 0);
    assert!(Op::ShrAssign.is_assign());
    assert!(!Op::EqEq.is_assign());
    assert_eq!(Op::NotEq.as_str(), "!=");
    assert_eq!(Keyword::Fallthrough.as_str(), "fallthrough");
}
