// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Go tokenizer.
//!
//! Produces a flat token vector plus the comments of the file. Comments are
//! not tokens; they are kept on the side with their spans so the splice
//! driver and the re-formatter can leave them untouched.
//!
//! # Automatic semicolons
//!
//! Go terminates statements with semicolons that are almost never written.
//! When a line's final token is an identifier, a literal, one of the keywords
//! `break`, `continue`, `fallthrough`, `return`, or one of `++ -- ) ] }`, the
//! tokenizer emits a [`TokType::AutoSemi`] at the newline. A block comment
//! that spans a newline counts as a newline, and end of input counts as one.

#[cfg(test)]
mod tests;

use iferr_core::patch::Span;
use thiserror::Error;

// ============================================================================
// Token Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        let kw = match word {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "chan" => Keyword::Chan,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "default" => Keyword::Default,
            "defer" => Keyword::Defer,
            "else" => Keyword::Else,
            "fallthrough" => Keyword::Fallthrough,
            "for" => Keyword::For,
            "func" => Keyword::Func,
            "go" => Keyword::Go,
            "goto" => Keyword::Goto,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "interface" => Keyword::Interface,
            "map" => Keyword::Map,
            "package" => Keyword::Package,
            "range" => Keyword::Range,
            "return" => Keyword::Return,
            "select" => Keyword::Select,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "type" => Keyword::Type,
            "var" => Keyword::Var,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Chan => "chan",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Default => "default",
            Keyword::Defer => "defer",
            Keyword::Else => "else",
            Keyword::Fallthrough => "fallthrough",
            Keyword::For => "for",
            Keyword::Func => "func",
            Keyword::Go => "go",
            Keyword::Goto => "goto",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::Interface => "interface",
            Keyword::Map => "map",
            Keyword::Package => "package",
            Keyword::Range => "range",
            Keyword::Return => "return",
            Keyword::Select => "select",
            Keyword::Struct => "struct",
            Keyword::Switch => "switch",
            Keyword::Type => "type",
            Keyword::Var => "var",
        }
    }
}

/// Operators and delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    AmpCaretAssign,
    AndAnd,
    OrOr,
    Arrow,
    Inc,
    Dec,
    EqEq,
    Lt,
    Gt,
    Assign,
    Not,
    Tilde,
    NotEq,
    LtEq,
    GtEq,
    Define,
    Ellipsis,
    LParen,
    LBracket,
    LBrace,
    Comma,
    Dot,
    RParen,
    RBracket,
    RBrace,
    Semi,
    Colon,
}

/// Operator spellings, longest first so the first prefix match wins.
const OPS: &[(&str, Op)] = &[
    ("<<=", Op::ShlAssign),
    (">>=", Op::ShrAssign),
    ("&^=", Op::AmpCaretAssign),
    ("...", Op::Ellipsis),
    ("&&", Op::AndAnd),
    ("||", Op::OrOr),
    ("<-", Op::Arrow),
    ("++", Op::Inc),
    ("--", Op::Dec),
    ("==", Op::EqEq),
    ("!=", Op::NotEq),
    ("<=", Op::LtEq),
    (">=", Op::GtEq),
    (":=", Op::Define),
    ("+=", Op::PlusAssign),
    ("-=", Op::MinusAssign),
    ("*=", Op::StarAssign),
    ("/=", Op::SlashAssign),
    ("%=", Op::PercentAssign),
    ("&=", Op::AmpAssign),
    ("|=", Op::PipeAssign),
    ("^=", Op::CaretAssign),
    ("<<", Op::Shl),
    (">>", Op::Shr),
    ("&^", Op::AmpCaret),
    ("+", Op::Plus),
    ("-", Op::Minus),
    ("*", Op::Star),
    ("/", Op::Slash),
    ("%", Op::Percent),
    ("&", Op::Amp),
    ("|", Op::Pipe),
    ("^", Op::Caret),
    ("<", Op::Lt),
    (">", Op::Gt),
    ("=", Op::Assign),
    ("!", Op::Not),
    ("~", Op::Tilde),
    ("(", Op::LParen),
    ("[", Op::LBracket),
    ("{", Op::LBrace),
    (",", Op::Comma),
    (".", Op::Dot),
    (")", Op::RParen),
    ("]", Op::RBracket),
    ("}", Op::RBrace),
    (";", Op::Semi),
    (":", Op::Colon),
];

impl Op {
    pub fn as_str(&self) -> &'static str {
        OPS.iter()
            .find(|(_, op)| op == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }

    /// Binary operator precedence (1 = `||` .. 5 = multiplicative), 0 if
    /// the operator is not binary.
    pub fn precedence(&self) -> u8 {
        match self {
            Op::OrOr => 1,
            Op::AndAnd => 2,
            Op::EqEq | Op::NotEq | Op::Lt | Op::LtEq | Op::Gt | Op::GtEq => 3,
            Op::Plus | Op::Minus | Op::Pipe | Op::Caret => 4,
            Op::Star | Op::Slash | Op::Percent | Op::Shl | Op::Shr | Op::Amp | Op::AmpCaret => 5,
            _ => 0,
        }
    }

    /// True for `=`, `:=` and the `op=` family.
    pub fn is_assign(&self) -> bool {
        matches!(
            self,
            Op::Assign
                | Op::Define
                | Op::PlusAssign
                | Op::MinusAssign
                | Op::StarAssign
                | Op::SlashAssign
                | Op::PercentAssign
                | Op::AmpAssign
                | Op::PipeAssign
                | Op::CaretAssign
                | Op::ShlAssign
                | Op::ShrAssign
                | Op::AmpCaretAssign
        )
    }

    pub fn is_opener(&self) -> bool {
        matches!(self, Op::LParen | Op::LBracket | Op::LBrace)
    }

    pub fn is_closer(&self) -> bool {
        matches!(self, Op::RParen | Op::RBracket | Op::RBrace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokType {
    Ident,
    Keyword(Keyword),
    Int,
    Float,
    Imag,
    Char,
    String,
    Op(Op),
    /// Semicolon inserted at a newline (or end of input).
    AutoSemi,
    Eof,
}

impl TokType {
    pub fn is_semi(&self) -> bool {
        matches!(self, TokType::AutoSemi | TokType::Op(Op::Semi))
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokType::Int | TokType::Float | TokType::Imag | TokType::Char | TokType::String
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub typ: TokType,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    pub span: Span,
    /// `/* ... */` rather than `// ...`.
    pub block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TokError {
    pub message: String,
    pub offset: usize,
}

/// Result of tokenizing a whole file.
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

// ============================================================================
// Tokenizer
// ============================================================================

pub fn tokenize(src: &str) -> Result<Tokenized, TokError> {
    let mut state = TokState::new(src);
    state.run()?;
    Ok(Tokenized {
        tokens: state.tokens,
        comments: state.comments,
    })
}

struct TokState<'a> {
    bytes: &'a [u8],
    src: &'a str,
    pos: usize,
    insert_semi: bool,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl<'a> TokState<'a> {
    fn new(src: &'a str) -> Self {
        TokState {
            bytes: src.as_bytes(),
            src,
            pos: 0,
            insert_semi: false,
            tokens: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error<T>(&self, offset: usize, message: impl Into<String>) -> Result<T, TokError> {
        Err(TokError {
            message: message.into(),
            offset,
        })
    }

    fn push(&mut self, typ: TokType, start: usize) {
        self.insert_semi = can_insert_semi_after(typ);
        self.tokens.push(Token {
            typ,
            span: Span::new(start, self.pos),
        });
    }

    fn auto_semi(&mut self, at: usize) {
        self.insert_semi = false;
        self.tokens.push(Token {
            typ: TokType::AutoSemi,
            span: Span::new(at, at),
        });
    }

    fn run(&mut self) -> Result<(), TokError> {
        loop {
            while matches!(self.peek(0), Some(b' ' | b'\t' | b'\r')) {
                self.pos += 1;
            }
            let start = self.pos;
            let Some(c) = self.peek(0) else {
                if self.insert_semi {
                    self.auto_semi(start);
                }
                self.tokens.push(Token {
                    typ: TokType::Eof,
                    span: Span::new(start, start),
                });
                return Ok(());
            };

            match c {
                b'\n' => {
                    if self.insert_semi {
                        self.auto_semi(start);
                    }
                    self.pos += 1;
                }
                b'/' if self.peek(1) == Some(b'/') => {
                    let end = memchr::memchr(b'\n', &self.bytes[start..])
                        .map(|p| start + p)
                        .unwrap_or(self.bytes.len());
                    self.pos = end;
                    self.comments.push(Comment {
                        span: Span::new(start, end),
                        block: false,
                    });
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let Some(close) = memchr::memmem::find(&self.bytes[start + 2..], b"*/")
                    else {
                        return self.error(start, "comment not terminated");
                    };
                    let end = start + 2 + close + 2;
                    if self.insert_semi && memchr::memchr(b'\n', &self.bytes[start..end]).is_some()
                    {
                        self.auto_semi(start);
                    }
                    self.pos = end;
                    self.comments.push(Comment {
                        span: Span::new(start, end),
                        block: true,
                    });
                }
                b'0'..=b'9' => {
                    let typ = self.scan_number()?;
                    self.push(typ, start);
                }
                b'.' if matches!(self.peek(1), Some(b'0'..=b'9')) => {
                    let typ = self.scan_number()?;
                    self.push(typ, start);
                }
                b'"' => {
                    self.scan_string()?;
                    self.push(TokType::String, start);
                }
                b'`' => {
                    let Some(close) = memchr::memchr(b'`', &self.bytes[start + 1..]) else {
                        return self.error(start, "raw string literal not terminated");
                    };
                    self.pos = start + 1 + close + 1;
                    self.push(TokType::String, start);
                }
                b'\'' => {
                    self.scan_rune()?;
                    self.push(TokType::Char, start);
                }
                _ if is_ident_start(self.src[start..].chars().next()) => {
                    self.scan_ident();
                    let word = &self.src[start..self.pos];
                    let typ = match Keyword::lookup(word) {
                        Some(kw) => TokType::Keyword(kw),
                        None => TokType::Ident,
                    };
                    self.push(typ, start);
                }
                _ => {
                    let rest = &self.bytes[start..];
                    let Some((text, op)) = OPS.iter().find(|(text, _)| rest.starts_with(text.as_bytes()))
                    else {
                        let ch = self.src[start..].chars().next().unwrap_or('?');
                        return self.error(start, format!("invalid character {:?}", ch));
                    };
                    self.pos += text.len();
                    self.push(TokType::Op(*op), start);
                }
            }
        }
    }

    fn scan_ident(&mut self) {
        for (i, ch) in self.src[self.pos..].char_indices() {
            if !(ch == '_' || ch.is_alphanumeric()) {
                self.pos += i;
                return;
            }
        }
        self.pos = self.bytes.len();
    }

    fn eat_digits(&mut self, is_digit: fn(u8) -> bool) {
        while let Some(c) = self.peek(0) {
            if is_digit(c) || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self) -> Result<TokType, TokError> {
        let start = self.pos;
        let mut typ = TokType::Int;

        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
            self.pos += 2;
            self.eat_digits(|c| c.is_ascii_hexdigit());
            if self.peek(0) == Some(b'.') {
                typ = TokType::Float;
                self.pos += 1;
                self.eat_digits(|c| c.is_ascii_hexdigit());
            }
            if matches!(self.peek(0), Some(b'p' | b'P')) {
                typ = TokType::Float;
                self.scan_exponent(start)?;
            }
        } else if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'b' | b'B')) {
            self.pos += 2;
            self.eat_digits(|c| c == b'0' || c == b'1');
        } else if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'o' | b'O')) {
            self.pos += 2;
            self.eat_digits(|c| (b'0'..=b'7').contains(&c));
        } else {
            self.eat_digits(|c| c.is_ascii_digit());
            if self.peek(0) == Some(b'.') {
                typ = TokType::Float;
                self.pos += 1;
                self.eat_digits(|c| c.is_ascii_digit());
            }
            if matches!(self.peek(0), Some(b'e' | b'E')) {
                typ = TokType::Float;
                self.scan_exponent(start)?;
            }
        }

        if self.peek(0) == Some(b'i') {
            self.pos += 1;
            typ = TokType::Imag;
        }
        Ok(typ)
    }

    fn scan_exponent(&mut self, start: usize) -> Result<(), TokError> {
        self.pos += 1;
        if matches!(self.peek(0), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        if !matches!(self.peek(0), Some(b'0'..=b'9')) {
            return self.error(start, "exponent has no digits");
        }
        self.eat_digits(|c| c.is_ascii_digit());
        Ok(())
    }

    fn scan_quoted(&mut self, quote: u8, what: &str) -> Result<(), TokError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    return self.error(start, format!("{} literal not terminated", what));
                }
                Some(b'\\') => self.pos += 2,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_string(&mut self) -> Result<(), TokError> {
        self.scan_quoted(b'"', "string")
    }

    fn scan_rune(&mut self) -> Result<(), TokError> {
        self.scan_quoted(b'\'', "rune")
    }
}

fn is_ident_start(ch: Option<char>) -> bool {
    matches!(ch, Some(c) if c == '_' || c.is_alphabetic())
}

fn can_insert_semi_after(typ: TokType) -> bool {
    match typ {
        TokType::Ident
        | TokType::Int
        | TokType::Float
        | TokType::Imag
        | TokType::Char
        | TokType::String => true,
        TokType::Keyword(kw) => matches!(
            kw,
            Keyword::Break | Keyword::Continue | Keyword::Fallthrough | Keyword::Return
        ),
        TokType::Op(op) => matches!(
            op,
            Op::Inc | Op::Dec | Op::RParen | Op::RBracket | Op::RBrace
        ),
        TokType::AutoSemi | TokType::Eof => false,
    }
}
