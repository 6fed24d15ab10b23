// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena construction for the grammar actions.
//!
//! Grammar rules address tokens by index; the builder turns index ranges
//! into byte spans and appends finished nodes to the arena. Actions run as
//! rules match, so an alternative that is later abandoned leaves its nodes
//! behind. Those nodes are unreachable from the root and harmless.

use std::cell::{Ref, RefCell};

use iferr_core::patch::Span;
use peg::error::ParseError;

use super::ParserError;
use crate::nodes::{DeclKeyword, LitKind, Node, NodeId, NodeKind};
use crate::tokenizer::{Keyword, Op, TokType, Token};

const MIXED_PARAMS: &str = "mixed named and unnamed parameters";

/// Tokens that can start an expression. Where the grammar wanted an
/// expression they are reported as that one word.
const EXPR_STARTS: &[&str] = &[
    "identifier",
    "literal",
    "(",
    "*",
    "<-",
    "func",
    "[",
    "map",
    "chan",
    "struct",
    "interface",
];

/// A simple statement before it is known where it ends up: an `if` or
/// `switch` header wants a bare expression, a statement list wraps it.
pub enum Simple {
    Stmt(NodeId),
    Expr(NodeId),
}

/// What follows the left-hand expression list of a simple statement.
pub enum Tail {
    Assign(Op, Vec<NodeId>),
    Send(NodeId),
    IncDec(bool),
}

pub struct RangeClause {
    pub key: Option<NodeId>,
    pub value: Option<NodeId>,
    pub op: Option<Op>,
    pub x: NodeId,
}

pub struct Builder<'s> {
    src: &'s str,
    tokens: &'s [Token],
    nodes: RefCell<Vec<Node>>,
    error: RefCell<Option<ParserError>>,
}

impl<'s> Builder<'s> {
    pub fn new(src: &'s str, tokens: &'s [Token]) -> Self {
        Builder {
            src,
            tokens,
            nodes: RefCell::new(Vec::new()),
            error: RefCell::new(None),
        }
    }

    /// The arena, or the first error found while building it.
    pub fn into_nodes(self) -> Result<Vec<Node>, ParserError> {
        match self.error.into_inner() {
            Some(err) => Err(err),
            None => Ok(self.nodes.into_inner()),
        }
    }

    // ========================================================================
    // Spans and arena access
    // ========================================================================

    /// The token at index `at`; past the end, the end-of-file token.
    pub fn token(&self, at: usize) -> Token {
        self.tokens
            .get(at)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or(Token {
                typ: TokType::Eof,
                span: Span::default(),
            })
    }

    /// End of the last token before index `end`, ignoring inserted
    /// semicolons.
    fn end_before(&self, end: usize) -> usize {
        self.tokens[..end.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| t.typ != TokType::AutoSemi)
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    /// Byte span of the tokens `start..end`.
    fn span(&self, start: usize, end: usize) -> Span {
        let from = self
            .tokens
            .get(start)
            .or_else(|| self.tokens.last())
            .map(|t| t.span.start)
            .unwrap_or(0);
        Span::new(from, self.end_before(end).max(from))
    }

    pub fn push(&self, kind: NodeKind, start: usize, end: usize) -> NodeId {
        let span = self.span(start, end);
        self.push_span(kind, span)
    }

    fn push_span(&self, kind: NodeKind, span: Span) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len() as u32);
        nodes.push(Node { kind, span });
        id
    }

    fn kind(&self, id: NodeId) -> Ref<'_, NodeKind> {
        Ref::map(self.nodes.borrow(), |nodes| &nodes[id.index()].kind)
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.nodes.borrow()[id.index()].span
    }

    fn fail_at(&self, id: NodeId, message: &str) {
        let span = self.span_of(id);
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(ParserError::SyntaxError {
                message: message.to_string(),
                span,
            });
        }
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    pub fn ident(&self, tok: Token) -> NodeId {
        let name = self.src[tok.span.start..tok.span.end].to_string();
        self.push_span(NodeKind::Ident { name }, tok.span)
    }

    /// The `.` of a dot import, kept as an identifier.
    pub fn dot(&self, tok: Token) -> NodeId {
        self.push_span(
            NodeKind::Ident {
                name: ".".to_string(),
            },
            tok.span,
        )
    }

    pub fn literal(&self, tok: Token) -> Option<NodeId> {
        let kind = match tok.typ {
            TokType::Int => LitKind::Int,
            TokType::Float => LitKind::Float,
            TokType::Imag => LitKind::Imag,
            TokType::Char => LitKind::Char,
            TokType::String => LitKind::String,
            _ => return None,
        };
        let value = self.src[tok.span.start..tok.span.end].to_string();
        Some(self.push_span(NodeKind::BasicLit { kind, value }, tok.span))
    }

    /// An `EmptyStmt` at the end of the token before `at`, as after a
    /// label that ends its block.
    pub fn empty_stmt(&self, at: usize) -> NodeId {
        let end = self.end_before(at);
        self.push_span(NodeKind::EmptyStmt, Span::new(end, end))
    }

    // ========================================================================
    // Expressions and types
    // ========================================================================

    /// Left-associative fold of `x op y op z ...`.
    pub fn binary(&self, x: NodeId, rest: Vec<(Op, NodeId)>) -> NodeId {
        rest.into_iter().fold(x, |x, (op, y)| {
            let span = Span::new(self.span_of(x).start, self.span_of(y).end);
            self.push_span(NodeKind::Binary { op, x, y }, span)
        })
    }

    /// `T`, `pkg.T`, `T[A, B]`; `mid` is where the selector ends.
    pub fn type_name(
        &self,
        name: NodeId,
        sel: Option<NodeId>,
        args: Option<Vec<NodeId>>,
        (start, mid, end): (usize, usize, usize),
    ) -> NodeId {
        let mut ty = name;
        if let Some(sel) = sel {
            ty = self.push(NodeKind::Selector { x: ty, sel }, start, mid);
        }
        if let Some(indices) = args {
            ty = self.push(NodeKind::Index { x: ty, indices }, start, end);
        }
        ty
    }

    pub fn func(&self, ty: NodeId, body: Option<NodeId>, start: usize, end: usize) -> NodeId {
        match body {
            Some(body) => self.push(NodeKind::FuncLit { ty, body }, start, end),
            None => ty,
        }
    }

    fn is_type_name(&self, x: NodeId) -> bool {
        match &*self.kind(x) {
            NodeKind::Ident { .. } => true,
            NodeKind::Selector { x, .. } => matches!(&*self.kind(*x), NodeKind::Ident { .. }),
            _ => false,
        }
    }

    fn is_literal_type(&self, x: NodeId) -> bool {
        match &*self.kind(x) {
            NodeKind::Ident { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::MapType { .. }
            | NodeKind::StructType { .. } => true,
            NodeKind::Selector { .. } => self.is_type_name(x),
            NodeKind::Index { x, .. } => self.is_type_name(*x),
            _ => false,
        }
    }

    /// Whether `x {` opens a composite literal. Inside a statement header a
    /// bare type name followed by `{` is the statement body instead.
    pub fn literal_ok(&self, x: NodeId, header: bool) -> bool {
        self.is_literal_type(x) && !(header && self.is_type_name(x))
    }

    /// Group parameter items into fields.
    ///
    /// Each item is a lone type-or-name, or a name followed by a type. Once
    /// any item has a type, the lone items before it are names sharing that
    /// type (`a, b int`); otherwise every item is a type.
    pub fn params(&self, items: Vec<(NodeId, Option<NodeId>)>, start: usize, end: usize) -> NodeId {
        let mut fields = Vec::new();
        if items.iter().any(|(_, ty)| ty.is_some()) {
            let mut pending: Vec<NodeId> = Vec::new();
            for (first, ty) in items {
                match ty {
                    None => {
                        if !matches!(&*self.kind(first), NodeKind::Ident { .. }) {
                            self.fail_at(first, MIXED_PARAMS);
                        }
                        pending.push(first);
                    }
                    Some(ty) => {
                        let mut names = std::mem::take(&mut pending);
                        names.push(first);
                        let span = Span::new(self.span_of(names[0]).start, self.span_of(ty).end);
                        fields.push(self.push_span(
                            NodeKind::Field {
                                names,
                                ty,
                                tag: None,
                            },
                            span,
                        ));
                    }
                }
            }
            if let Some(&dangling) = pending.first() {
                self.fail_at(dangling, MIXED_PARAMS);
            }
        } else {
            for (ty, _) in items {
                let span = self.span_of(ty);
                fields.push(self.push_span(
                    NodeKind::Field {
                        names: Vec::new(),
                        ty,
                        tag: None,
                    },
                    span,
                ));
            }
        }
        self.push(
            NodeKind::FieldList {
                fields,
                delimited: true,
            },
            start,
            end,
        )
    }

    /// An unparenthesized result type.
    pub fn single_result(&self, ty: NodeId, start: usize, end: usize) -> NodeId {
        let field = self.push(
            NodeKind::Field {
                names: Vec::new(),
                ty,
                tag: None,
            },
            start,
            end,
        );
        self.push(
            NodeKind::FieldList {
                fields: vec![field],
                delimited: false,
            },
            start,
            end,
        )
    }

    /// A struct or interface body; `list_start` is the index of its `{`.
    pub fn braced_fields(
        &self,
        fields: Vec<NodeId>,
        wrap: fn(NodeId) -> NodeKind,
        (start, list_start, end): (usize, usize, usize),
    ) -> NodeId {
        let list = self.push(
            NodeKind::FieldList {
                fields,
                delimited: true,
            },
            list_start,
            end,
        );
        self.push(wrap(list), start, end)
    }

    // ========================================================================
    // Declarations and statements
    // ========================================================================

    pub fn gen_decl(
        &self,
        keyword: DeclKeyword,
        (specs, grouped): (Vec<NodeId>, bool),
        start: usize,
        end: usize,
    ) -> NodeId {
        self.push(
            NodeKind::GenDecl {
                keyword,
                specs,
                grouped,
            },
            start,
            end,
        )
    }

    pub fn branch(&self, keyword: Keyword, label: Option<NodeId>, start: usize, end: usize) -> NodeId {
        self.push(NodeKind::BranchStmt { keyword, label }, start, end)
    }

    pub fn simple(
        &self,
        lhs: Vec<NodeId>,
        tail: Option<Tail>,
        start: usize,
        end: usize,
    ) -> Result<Simple, &'static str> {
        let single = lhs.len() == 1;
        let stmt = match tail {
            Some(Tail::Assign(op, rhs)) => NodeKind::AssignStmt { lhs, op, rhs },
            Some(Tail::Send(value)) if single => NodeKind::SendStmt { chan: lhs[0], value },
            Some(Tail::IncDec(inc)) if single => NodeKind::IncDecStmt { x: lhs[0], inc },
            None if single => return Ok(Simple::Expr(lhs[0])),
            None => return Err("assignment"),
            Some(_) => return Err("single expression"),
        };
        Ok(Simple::Stmt(self.push(stmt, start, end)))
    }

    /// The statement node for `simple`; a bare expression becomes an
    /// `ExprStmt` with the expression's span.
    pub fn finish(&self, simple: Simple) -> NodeId {
        match simple {
            Simple::Stmt(id) => id,
            Simple::Expr(x) => {
                let span = self.span_of(x);
                self.push_span(NodeKind::ExprStmt { x }, span)
            }
        }
    }

    /// `if [init;] cond {...} [else ...]`. Without a semicolon the header
    /// is the condition; with one, `cond` holds what follows it.
    pub fn if_stmt(
        &self,
        head: Option<Simple>,
        cond: Option<Option<NodeId>>,
        (body, els): (NodeId, Option<NodeId>),
        start: usize,
        end: usize,
    ) -> Result<NodeId, &'static str> {
        let (init, cond) = match (head, cond) {
            (head, Some(Some(cond))) => (head.map(|s| self.finish(s)), cond),
            (Some(Simple::Expr(cond)), None) => (None, cond),
            _ => return Err("condition"),
        };
        Ok(self.push(
            NodeKind::IfStmt {
                init,
                cond,
                body,
                els,
            },
            start,
            end,
        ))
    }

    fn is_guard_expr(&self, x: NodeId) -> bool {
        matches!(&*self.kind(x), NodeKind::TypeAssert { ty: None, .. })
    }

    fn is_type_switch_guard(&self, simple: &Simple) -> bool {
        match simple {
            Simple::Expr(x) => self.is_guard_expr(*x),
            Simple::Stmt(id) => match &*self.kind(*id) {
                NodeKind::AssignStmt {
                    lhs,
                    op: Op::Define,
                    rhs,
                } => lhs.len() == 1 && rhs.len() == 1 && self.is_guard_expr(rhs[0]),
                _ => false,
            },
        }
    }

    /// `switch [init;] [tag] {...}`, a type switch when the tag is a
    /// `x.(type)` guard.
    pub fn switch_stmt(
        &self,
        head: Option<Simple>,
        tag: Option<Option<Simple>>,
        body: NodeId,
        start: usize,
        end: usize,
    ) -> Result<NodeId, &'static str> {
        let (init, tag) = match tag {
            Some(tag) => (head.map(|s| self.finish(s)), tag),
            None => (None, head),
        };
        let kind = match tag {
            Some(guard) if self.is_type_switch_guard(&guard) => NodeKind::TypeSwitchStmt {
                init,
                assign: self.finish(guard),
                body,
            },
            Some(Simple::Expr(x)) => NodeKind::SwitchStmt {
                init,
                tag: Some(x),
                body,
            },
            None => NodeKind::SwitchStmt {
                init,
                tag: None,
                body,
            },
            Some(Simple::Stmt(_)) => return Err("switch expression"),
        };
        Ok(self.push(kind, start, end))
    }

    pub fn select_stmt(&self, clauses: Vec<NodeId>, (start, body_start, end): (usize, usize, usize)) -> NodeId {
        let body = self.push(NodeKind::BlockStmt { stmts: clauses }, body_start, end);
        self.push(NodeKind::SelectStmt { body }, start, end)
    }

    pub fn for_stmt(
        &self,
        (init, cond, post): (Option<Simple>, Option<NodeId>, Option<Simple>),
        body: NodeId,
        start: usize,
        end: usize,
    ) -> NodeId {
        let init = init.map(|s| self.finish(s));
        let post = post.map(|s| self.finish(s));
        self.push(
            NodeKind::ForStmt {
                init,
                cond,
                post,
                body,
            },
            start,
            end,
        )
    }

    pub fn range_stmt(&self, range: RangeClause, body: NodeId, start: usize, end: usize) -> NodeId {
        let RangeClause { key, value, op, x } = range;
        self.push(
            NodeKind::RangeStmt {
                key,
                value,
                op,
                x,
                body,
            },
            start,
            end,
        )
    }

    // ========================================================================
    // Errors
    // ========================================================================

    /// Turn a grammar failure into a [`ParserError`] at the offending token.
    pub fn syntax_error(&self, err: &ParseError<usize>) -> ParserError {
        let tok = self
            .tokens
            .get(err.location)
            .or_else(|| self.tokens.last())
            .copied();
        let span = tok.map(|t| t.span).unwrap_or_default();
        let found = match tok.map(|t| t.typ) {
            Some(TokType::AutoSemi) => "newline".to_string(),
            Some(TokType::Eof) | None => "EOF".to_string(),
            Some(_) => format!("'{}'", &self.src[span.start..span.end]),
        };

        let mut labels: Vec<&str> = err.expected.tokens().collect();
        if labels.contains(&"expression") {
            labels.retain(|label| !EXPR_STARTS.contains(label));
        }
        let mut expected: Vec<String> = labels.into_iter().map(describe_expected).collect();
        expected.sort();
        expected.dedup();
        let expected = match expected.as_slice() {
            [] => "declaration".to_string(),
            [one] => one.clone(),
            many => format!("one of {}", many.join(", ")),
        };
        ParserError::SyntaxError {
            message: format!("expected {}, found {}", expected, found),
            span,
        }
    }
}

/// Keywords and operators are quoted; descriptive labels such as
/// `identifier` are not.
fn describe_expected(token: &str) -> String {
    let symbolic = token.chars().any(|c| !c.is_ascii_alphabetic() && c != ' ');
    if symbolic || Keyword::lookup(token).is_some() {
        format!("'{}'", token)
    } else {
        token.to_string()
    }
}
