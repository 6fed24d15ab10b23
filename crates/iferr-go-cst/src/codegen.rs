// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Rendering syntax back to text.
//!
//! Output uses gofmt's canonical spacing: tab indentation, one space around
//! binary operators except where gofmt drops it to show precedence
//! (`a*b + c`), `, ` between list elements. Comments are not rendered;
//! callers that need original text splice it back in from the source.

use std::fmt;

use crate::nodes::{ArrayLen, ChanDir, DeclKeyword, NodeId, NodeKind, SourceTree};
use crate::tokenizer::{Keyword, Op};

// ============================================================================
// State
// ============================================================================

#[derive(Debug)]
pub struct CodegenState {
    pub tokens: String,
    pub indent_level: usize,
    pub default_newline: &'static str,
    pub default_indent: &'static str,
}

impl Default for CodegenState {
    fn default() -> Self {
        CodegenState {
            tokens: String::new(),
            indent_level: 0,
            default_newline: "\n",
            default_indent: "\t",
        }
    }
}

impl CodegenState {
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn add_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.tokens.push_str(self.default_indent);
        }
    }

    pub fn add_newline(&mut self) {
        self.tokens.push_str(self.default_newline);
    }

    pub fn add_token(&mut self, tok: &str) {
        self.tokens.push_str(tok);
    }
}

impl fmt::Display for CodegenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens)
    }
}

pub trait Codegen {
    fn codegen(&self, state: &mut CodegenState);

    /// Render on its own, starting at indentation level zero.
    fn to_code(&self) -> String {
        let mut state = CodegenState::default();
        self.codegen(&mut state);
        state.to_string()
    }
}

/// A node of a [`SourceTree`], renderable through [`Codegen`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    pub tree: &'t SourceTree,
    pub id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn new(tree: &'t SourceTree, id: NodeId) -> Self {
        NodeRef { tree, id }
    }
}

impl Codegen for NodeRef<'_> {
    fn codegen(&self, state: &mut CodegenState) {
        let p = Printer { tree: self.tree };
        let kind = self.tree.kind(self.id);
        if kind.is_stmt() {
            p.stmt(self.id, state);
        } else {
            match kind {
                NodeKind::File { .. }
                | NodeKind::GenDecl { .. }
                | NodeKind::FuncDecl { .. }
                | NodeKind::ImportSpec { .. }
                | NodeKind::ValueSpec { .. }
                | NodeKind::TypeSpec { .. } => p.decl(self.id, state),
                _ => p.expr(self.id, state),
            }
        }
    }
}

// ============================================================================
// Printer
// ============================================================================

const LOWEST_PREC: u8 = 0;
const UNARY_PREC: u8 = 6;
const HIGHEST_PREC: u8 = 7;

struct Printer<'t> {
    tree: &'t SourceTree,
}

impl Printer<'_> {
    fn kind(&self, id: NodeId) -> &NodeKind {
        self.tree.kind(id)
    }

    fn expr(&self, id: NodeId, state: &mut CodegenState) {
        self.expr1(id, LOWEST_PREC, 1, state);
    }

    fn expr0(&self, id: NodeId, depth: usize, state: &mut CodegenState) {
        self.expr1(id, LOWEST_PREC, depth, state);
    }

    fn expr_list(&self, list: &[NodeId], depth: usize, state: &mut CodegenState) {
        for (i, &x) in list.iter().enumerate() {
            if i > 0 {
                state.add_token(", ");
            }
            self.expr0(x, depth, state);
        }
    }

    fn expr1(&self, id: NodeId, prec1: u8, depth: usize, state: &mut CodegenState) {
        match self.kind(id) {
            NodeKind::Ident { name } => state.add_token(name),
            NodeKind::BasicLit { value, .. } => state.add_token(value),
            NodeKind::Binary { op, .. } => {
                let depth = depth.max(1);
                let cutoff = self.cutoff(id, depth);
                // Synthesized trees may lack the parentheses the source
                // would need.
                let wrap = op.precedence() < prec1;
                if wrap {
                    state.add_token("(");
                }
                self.binary(id, cutoff, depth, state);
                if wrap {
                    state.add_token(")");
                }
            }
            NodeKind::KeyValue { key, value } => {
                self.expr0(*key, depth, state);
                state.add_token(": ");
                self.expr0(*value, depth, state);
            }
            NodeKind::Star { x } | NodeKind::Unary { x, .. } => {
                let wrap = UNARY_PREC < prec1;
                if wrap {
                    state.add_token("(");
                }
                match self.kind(id) {
                    NodeKind::Unary { op, .. } => state.add_token(op.as_str()),
                    _ => state.add_token("*"),
                }
                self.expr1(*x, UNARY_PREC, depth, state);
                if wrap {
                    state.add_token(")");
                }
            }
            NodeKind::Paren { x } => {
                if matches!(self.kind(*x), NodeKind::Paren { .. }) {
                    self.expr0(*x, depth, state);
                } else {
                    state.add_token("(");
                    self.expr0(*x, reduce_depth(depth), state);
                    state.add_token(")");
                }
            }
            NodeKind::Selector { x, sel } => {
                self.expr1(*x, HIGHEST_PREC, depth, state);
                state.add_token(".");
                self.expr1(*sel, HIGHEST_PREC, depth, state);
            }
            NodeKind::TypeAssert { x, ty } => {
                self.expr1(*x, HIGHEST_PREC, depth, state);
                state.add_token(".(");
                match ty {
                    Some(ty) => self.expr(*ty, state),
                    None => state.add_token(Keyword::Type.as_str()),
                }
                state.add_token(")");
            }
            NodeKind::Index { x, indices } => {
                self.expr1(*x, HIGHEST_PREC, 1, state);
                state.add_token("[");
                self.expr_list(indices, depth + 1, state);
                state.add_token("]");
            }
            NodeKind::Slice { x, low, high, max } => {
                self.expr1(*x, HIGHEST_PREC, 1, state);
                state.add_token("[");
                let mut indices = vec![*low, *high];
                if max.is_some() {
                    indices.push(*max);
                }
                let present = indices.iter().flatten().count();
                let has_binaries = indices
                    .iter()
                    .flatten()
                    .any(|&i| matches!(self.kind(i), NodeKind::Binary { .. }));
                let needs_blanks = depth <= 1 && present > 1 && has_binaries;
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        if indices[i - 1].is_some() && needs_blanks {
                            state.add_token(" ");
                        }
                        state.add_token(":");
                        if index.is_some() && needs_blanks {
                            state.add_token(" ");
                        }
                    }
                    if let Some(index) = index {
                        self.expr0(*index, depth + 1, state);
                    }
                }
                state.add_token("]");
            }
            NodeKind::Call {
                fun,
                args,
                ellipsis,
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                if matches!(self.kind(*fun), NodeKind::FuncType { .. }) {
                    state.add_token("(");
                    self.expr(*fun, state);
                    state.add_token(")");
                } else {
                    self.expr1(*fun, HIGHEST_PREC, depth, state);
                }
                state.add_token("(");
                self.expr_list(args, depth, state);
                if *ellipsis {
                    state.add_token("...");
                }
                state.add_token(")");
            }
            NodeKind::CompositeLit { ty, elts } => {
                if let Some(ty) = ty {
                    self.expr1(*ty, HIGHEST_PREC, depth, state);
                }
                state.add_token("{");
                self.expr_list(elts, 1, state);
                state.add_token("}");
            }
            NodeKind::FuncLit { ty, body } => {
                self.expr(*ty, state);
                state.add_token(" ");
                self.block(*body, state);
            }
            NodeKind::ArrayType { len, elem } => {
                state.add_token("[");
                match len {
                    ArrayLen::Slice => {}
                    ArrayLen::Ellipsis => state.add_token("..."),
                    ArrayLen::Expr(len) => self.expr(*len, state),
                }
                state.add_token("]");
                self.expr(*elem, state);
            }
            NodeKind::MapType { key, value } => {
                state.add_token("map[");
                self.expr(*key, state);
                state.add_token("]");
                self.expr(*value, state);
            }
            NodeKind::ChanType { dir, elem } => {
                state.add_token(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(*elem, state);
            }
            NodeKind::FuncType { .. } => {
                state.add_token(Keyword::Func.as_str());
                self.signature(id, state);
            }
            NodeKind::StructType { fields } => {
                state.add_token(Keyword::Struct.as_str());
                self.braced_fields(*fields, state);
            }
            NodeKind::InterfaceType { methods } => {
                state.add_token(Keyword::Interface.as_str());
                self.braced_fields(*methods, state);
            }
            NodeKind::Ellipsis { elem } => {
                state.add_token("...");
                self.expr(*elem, state);
            }
            NodeKind::FieldList { .. } => self.params(id, state),
            NodeKind::Field { .. } => self.field(id, state),
            other => state.add_token(other.description()),
        }
    }

    // ------------------------------------------------------------------------
    // Binary expressions (gofmt precedence-based spacing)
    // ------------------------------------------------------------------------

    fn binary(&self, id: NodeId, cutoff: u8, depth: usize, state: &mut CodegenState) {
        let NodeKind::Binary { op, x, y } = self.kind(id) else {
            return;
        };
        let prec = op.precedence();
        let print_blank = prec < cutoff;
        self.expr1(*x, prec, depth + self.diff_prec(*x, prec), state);
        if print_blank {
            state.add_token(" ");
        }
        state.add_token(op.as_str());
        if print_blank {
            state.add_token(" ");
        }
        self.expr1(*y, prec + 1, depth + 1, state);
    }

    fn cutoff(&self, id: NodeId, depth: usize) -> u8 {
        let (has4, has5, max_problem) = self.walk_binary(id);
        if max_problem > 0 {
            return max_problem + 1;
        }
        if has4 && has5 {
            return if depth == 1 { 5 } else { 4 };
        }
        if depth == 1 {
            6
        } else {
            4
        }
    }

    fn walk_binary(&self, id: NodeId) -> (bool, bool, u8) {
        let NodeKind::Binary { op, x, y } = self.kind(id) else {
            return (false, false, 0);
        };
        let prec = op.precedence();
        let mut has4 = prec == 4;
        let mut has5 = prec == 5;
        let mut max_problem = 0;

        if let NodeKind::Binary { op: lop, .. } = self.kind(*x) {
            if lop.precedence() >= prec {
                let (h4, h5, mp) = self.walk_binary(*x);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
        }

        match self.kind(*y) {
            NodeKind::Binary { op: rop, .. } => {
                if rop.precedence() > prec {
                    let (h4, h5, mp) = self.walk_binary(*y);
                    has4 |= h4;
                    has5 |= h5;
                    max_problem = max_problem.max(mp);
                }
            }
            NodeKind::Star { .. } => {
                if *op == Op::Slash {
                    max_problem = 5;
                }
            }
            NodeKind::Unary { op: uop, .. } => {
                match (op.as_str(), uop.as_str()) {
                    ("/", "*") | ("&", "&") | ("&", "^") => max_problem = 5,
                    ("+", "+") | ("-", "-") => max_problem = max_problem.max(4),
                    _ => {}
                }
            }
            _ => {}
        }
        (has4, has5, max_problem)
    }

    fn diff_prec(&self, id: NodeId, prec: u8) -> usize {
        match self.kind(id) {
            NodeKind::Binary { op, .. } if op.precedence() == prec => 0,
            _ => 1,
        }
    }

    // ------------------------------------------------------------------------
    // Signatures and fields
    // ------------------------------------------------------------------------

    /// Parameters and results of a FuncType, without the `func` keyword.
    fn signature(&self, id: NodeId, state: &mut CodegenState) {
        let NodeKind::FuncType { params, results } = self.kind(id) else {
            return;
        };
        self.params(*params, state);
        if let Some(results) = results {
            state.add_token(" ");
            match self.kind(*results) {
                NodeKind::FieldList {
                    fields,
                    delimited: false,
                } if fields.len() == 1 => self.field(fields[0], state),
                _ => self.params(*results, state),
            }
        }
    }

    fn params(&self, id: NodeId, state: &mut CodegenState) {
        let NodeKind::FieldList { fields, .. } = self.kind(id) else {
            return;
        };
        // Type parameter lists are bracketed in the source.
        let bracketed = self.tree.text(id).starts_with('[');
        state.add_token(if bracketed { "[" } else { "(" });
        for (i, &field) in fields.iter().enumerate() {
            if i > 0 {
                state.add_token(", ");
            }
            self.field(field, state);
        }
        state.add_token(if bracketed { "]" } else { ")" });
    }

    fn field(&self, id: NodeId, state: &mut CodegenState) {
        let NodeKind::Field { names, ty, tag } = self.kind(id) else {
            return;
        };
        for (i, &name) in names.iter().enumerate() {
            if i > 0 {
                state.add_token(", ");
            }
            self.expr(name, state);
        }
        if !names.is_empty() {
            state.add_token(" ");
        }
        if names.len() == 1 && self.is_method_signature(*ty) {
            // Interface method: the signature follows the name directly.
            state.tokens.pop();
            self.signature(*ty, state);
        } else {
            self.expr(*ty, state);
        }
        if let Some(tag) = tag {
            state.add_token(" ");
            self.expr(*tag, state);
        }
    }

    /// An interface method's FuncType has no `func` keyword in the source.
    fn is_method_signature(&self, ty: NodeId) -> bool {
        matches!(self.kind(ty), NodeKind::FuncType { .. }) && !self.tree.text(ty).starts_with("func")
    }

    /// `{}` when empty, otherwise the one-line form `{ a int; b string }`.
    fn braced_fields(&self, list: NodeId, state: &mut CodegenState) {
        let NodeKind::FieldList { fields, .. } = self.kind(list) else {
            return;
        };
        if fields.is_empty() {
            state.add_token("{}");
            return;
        }
        state.add_token("{ ");
        for (i, &field) in fields.iter().enumerate() {
            if i > 0 {
                state.add_token("; ");
            }
            self.field(field, state);
        }
        state.add_token(" }");
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn block(&self, id: NodeId, state: &mut CodegenState) {
        let NodeKind::BlockStmt { stmts } = self.kind(id) else {
            return;
        };
        state.add_token("{");
        state.add_newline();
        state.indent();
        self.stmt_lines(stmts, state);
        state.dedent();
        state.add_indent();
        state.add_token("}");
    }

    /// One statement per line at the current indentation; labels are
    /// outdented by one level.
    fn stmt_lines(&self, stmts: &[NodeId], state: &mut CodegenState) {
        for &stmt in stmts {
            if let NodeKind::LabeledStmt { label, stmt } = self.kind(stmt) {
                state.dedent();
                state.add_indent();
                state.indent();
                self.expr(*label, state);
                state.add_token(":");
                state.add_newline();
                if !matches!(self.kind(*stmt), NodeKind::EmptyStmt) {
                    state.add_indent();
                    self.stmt(*stmt, state);
                    state.add_newline();
                }
                continue;
            }
            state.add_indent();
            self.stmt(stmt, state);
            state.add_newline();
        }
    }

    fn stmt(&self, id: NodeId, state: &mut CodegenState) {
        match self.kind(id) {
            NodeKind::DeclStmt { decl } => self.decl(*decl, state),
            NodeKind::EmptyStmt => {}
            NodeKind::LabeledStmt { label, stmt } => {
                self.expr(*label, state);
                state.add_token(":");
                if !matches!(self.kind(*stmt), NodeKind::EmptyStmt) {
                    state.add_token(" ");
                    self.stmt(*stmt, state);
                }
            }
            NodeKind::ExprStmt { x } => self.expr(*x, state),
            NodeKind::SendStmt { chan, value } => {
                self.expr(*chan, state);
                state.add_token(" <- ");
                self.expr(*value, state);
            }
            NodeKind::IncDecStmt { x, inc } => {
                self.expr(*x, state);
                state.add_token(if *inc { "++" } else { "--" });
            }
            NodeKind::AssignStmt { lhs, op, rhs } => {
                let depth = if lhs.len() > 1 && rhs.len() > 1 { 2 } else { 1 };
                self.expr_list(lhs, depth, state);
                state.add_token(" ");
                state.add_token(op.as_str());
                state.add_token(" ");
                self.expr_list(rhs, depth, state);
            }
            NodeKind::GoStmt { call } => {
                state.add_token("go ");
                self.expr(*call, state);
            }
            NodeKind::DeferStmt { call } => {
                state.add_token("defer ");
                self.expr(*call, state);
            }
            NodeKind::ReturnStmt { results } => {
                state.add_token(Keyword::Return.as_str());
                if !results.is_empty() {
                    state.add_token(" ");
                    self.expr_list(results, 1, state);
                }
            }
            NodeKind::BranchStmt { keyword, label } => {
                state.add_token(keyword.as_str());
                if let Some(label) = label {
                    state.add_token(" ");
                    self.expr(*label, state);
                }
            }
            NodeKind::BlockStmt { .. } => self.block(id, state),
            NodeKind::IfStmt {
                init,
                cond,
                body,
                els,
            } => {
                state.add_token("if ");
                if let Some(init) = init {
                    self.stmt(*init, state);
                    state.add_token("; ");
                }
                self.expr(*cond, state);
                state.add_token(" ");
                self.block(*body, state);
                if let Some(els) = els {
                    state.add_token(" else ");
                    self.stmt(*els, state);
                }
            }
            NodeKind::CaseClause {
                default,
                list,
                body,
            } => {
                if *default {
                    state.add_token("default:");
                } else {
                    state.add_token("case ");
                    self.expr_list(list, 1, state);
                    state.add_token(":");
                }
                self.clause_body(body, state);
            }
            NodeKind::CommClause { comm, body } => {
                match comm {
                    Some(comm) => {
                        state.add_token("case ");
                        self.stmt(*comm, state);
                        state.add_token(":");
                    }
                    None => state.add_token("default:"),
                }
                self.clause_body(body, state);
            }
            NodeKind::SwitchStmt { init, tag, body } => {
                state.add_token("switch ");
                if let Some(init) = init {
                    self.stmt(*init, state);
                    state.add_token("; ");
                }
                if let Some(tag) = tag {
                    self.expr(*tag, state);
                    state.add_token(" ");
                }
                self.clauses(*body, state);
            }
            NodeKind::TypeSwitchStmt { init, assign, body } => {
                state.add_token("switch ");
                if let Some(init) = init {
                    self.stmt(*init, state);
                    state.add_token("; ");
                }
                self.stmt(*assign, state);
                state.add_token(" ");
                self.clauses(*body, state);
            }
            NodeKind::SelectStmt { body } => {
                state.add_token("select ");
                self.clauses(*body, state);
            }
            NodeKind::ForStmt {
                init,
                cond,
                post,
                body,
            } => {
                state.add_token("for ");
                if init.is_some() || post.is_some() {
                    if let Some(init) = init {
                        self.stmt(*init, state);
                    }
                    state.add_token("; ");
                    if let Some(cond) = cond {
                        self.expr(*cond, state);
                    }
                    state.add_token("; ");
                    if let Some(post) = post {
                        self.stmt(*post, state);
                        state.add_token(" ");
                    }
                } else if let Some(cond) = cond {
                    self.expr(*cond, state);
                    state.add_token(" ");
                }
                self.block(*body, state);
            }
            NodeKind::RangeStmt {
                key,
                value,
                op,
                x,
                body,
            } => {
                state.add_token("for ");
                if let Some(key) = key {
                    self.expr(*key, state);
                    if let Some(value) = value {
                        state.add_token(", ");
                        self.expr(*value, state);
                    }
                    state.add_token(" ");
                    state.add_token(op.unwrap_or(Op::Define).as_str());
                    state.add_token(" ");
                }
                state.add_token("range ");
                self.expr(*x, state);
                state.add_token(" ");
                self.block(*body, state);
            }
            _ => self.expr(id, state),
        }
    }

    /// Switch and select bodies: clauses at the statement's level.
    fn clauses(&self, body: NodeId, state: &mut CodegenState) {
        let NodeKind::BlockStmt { stmts } = self.kind(body) else {
            return;
        };
        state.add_token("{");
        state.add_newline();
        for &clause in stmts {
            state.add_indent();
            self.stmt(clause, state);
        }
        state.add_indent();
        state.add_token("}");
    }

    fn clause_body(&self, body: &[NodeId], state: &mut CodegenState) {
        state.add_newline();
        state.indent();
        self.stmt_lines(body, state);
        state.dedent();
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn decl(&self, id: NodeId, state: &mut CodegenState) {
        match self.kind(id) {
            NodeKind::File { package, decls } => {
                state.add_token("package ");
                self.expr(*package, state);
                state.add_newline();
                for &decl in decls {
                    state.add_newline();
                    self.decl(decl, state);
                    state.add_newline();
                }
            }
            NodeKind::GenDecl {
                keyword,
                specs,
                grouped,
            } => {
                state.add_token(keyword.as_str());
                if *grouped {
                    state.add_token(" (");
                    state.add_newline();
                    state.indent();
                    for &spec in specs {
                        state.add_indent();
                        self.spec(*keyword, spec, state);
                        state.add_newline();
                    }
                    state.dedent();
                    state.add_indent();
                    state.add_token(")");
                } else if let Some(&spec) = specs.first() {
                    state.add_token(" ");
                    self.spec(*keyword, spec, state);
                }
            }
            NodeKind::FuncDecl {
                recv,
                name,
                type_params,
                ty,
                body,
            } => {
                state.add_token("func ");
                if let Some(recv) = recv {
                    self.params(*recv, state);
                    state.add_token(" ");
                }
                self.expr(*name, state);
                if let Some(tparams) = type_params {
                    self.params(*tparams, state);
                }
                self.signature(*ty, state);
                if let Some(body) = body {
                    state.add_token(" ");
                    self.block(*body, state);
                }
            }
            NodeKind::ImportSpec { .. } => self.spec(DeclKeyword::Import, id, state),
            NodeKind::ValueSpec { .. } => self.spec(DeclKeyword::Var, id, state),
            NodeKind::TypeSpec { .. } => self.spec(DeclKeyword::Type, id, state),
            _ => self.expr(id, state),
        }
    }

    fn spec(&self, _keyword: DeclKeyword, id: NodeId, state: &mut CodegenState) {
        match self.kind(id) {
            NodeKind::ImportSpec { name, path } => {
                if let Some(name) = name {
                    self.expr(*name, state);
                    state.add_token(" ");
                }
                self.expr(*path, state);
            }
            NodeKind::ValueSpec { names, ty, values } => {
                self.expr_list(names, 1, state);
                if let Some(ty) = ty {
                    state.add_token(" ");
                    self.expr(*ty, state);
                }
                if !values.is_empty() {
                    state.add_token(" = ");
                    self.expr_list(values, 1, state);
                }
            }
            NodeKind::TypeSpec {
                name,
                type_params,
                alias,
                ty,
            } => {
                self.expr(*name, state);
                if let Some(tparams) = type_params {
                    self.params(*tparams, state);
                }
                state.add_token(if *alias { " = " } else { " " });
                self.expr(*ty, state);
            }
            _ => self.expr(id, state),
        }
    }
}

fn reduce_depth(depth: usize) -> usize {
    depth.saturating_sub(1).max(1)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    fn render_value(expr: &str) -> String {
        let tree = parse_file(&format!("package p\nvar _ = {}\n", expr)).expect("parse");
        let NodeKind::GenDecl { specs, .. } = tree.kind(tree.decls()[0]) else {
            panic!("not a decl");
        };
        let NodeKind::ValueSpec { values, .. } = tree.kind(specs[0]) else {
            panic!("not a value spec");
        };
        NodeRef::new(&tree, values[0]).to_code()
    }

    fn render_body(body: &str) -> String {
        let tree = parse_file(&format!("package p\nfunc f() {{\n{}\n}}\n", body)).expect("parse");
        let NodeKind::FuncDecl { body: Some(b), .. } = tree.kind(tree.decls()[0]) else {
            panic!("not a func");
        };
        NodeRef::new(&tree, *b).to_code()
    }

    mod expressions {
        use super::*;

        #[test]
        fn binary_spacing_follows_precedence() {
            assert_eq!(render_value("a+b"), "a + b");
            assert_eq!(render_value("a  *  b+c"), "a*b + c");
            assert_eq!(render_value("x==nil||y!=nil"), "x == nil || y != nil");
            assert_eq!(render_value("f(a+b, c)"), "f(a+b, c)");
            assert_eq!(render_value("f(a + b)"), "f(a + b)");
            assert_eq!(render_value("s[i+1]"), "s[i+1]");
        }

        #[test]
        fn literals_and_calls() {
            assert_eq!(render_value("T{ }"), "T{}");
            assert_eq!(render_value("[ 4 ]byte{}"), "[4]byte{}");
            assert_eq!(render_value("map[string]int{\"a\":1}"), "map[string]int{\"a\": 1}");
            assert_eq!(render_value("append(xs,  ys...)"), "append(xs, ys...)");
            assert_eq!(render_value("x.( T )"), "x.(T)");
            assert_eq!(render_value("s[ a : b ]"), "s[a:b]");
            assert_eq!(render_value("s[a+1:b]"), "s[a+1 : b]");
            assert_eq!(render_value("& T {}"), "&T{}");
            assert_eq!(render_value("<- ch"), "<-ch");
        }

        #[test]
        fn types() {
            assert_eq!(render_value("(*os.File)(nil)"), "(*os.File)(nil)");
            assert_eq!(render_value("make(chan<- int)"), "make(chan<- int)");
            assert_eq!(render_value("struct{a int; b string}{}"), "struct{ a int; b string }{}");
            assert_eq!(render_value("interface{}(nil)"), "interface{}(nil)");
            assert_eq!(
                render_value("func(a, b int) (int, error) { return a, nil }"),
                "func(a, b int) (int, error) {\n\treturn a, nil\n}"
            );
        }
    }

    mod statements {
        use super::*;

        #[test]
        fn block_indentation() {
            assert_eq!(
                render_body("if err:=g();err!=nil{\nreturn 0,err\n}"),
                "{\n\tif err := g(); err != nil {\n\t\treturn 0, err\n\t}\n}"
            );
        }

        #[test]
        fn loops_and_switches() {
            assert_eq!(
                render_body("for i:=0;i<3;i++{\n}\nfor k,v:=range m{\n_=v\n}"),
                "{\n\tfor i := 0; i < 3; i++ {\n\t}\n\tfor k, v := range m {\n\t\t_ = v\n\t}\n}"
            );
            assert_eq!(
                render_body("switch x{\ncase 1,2:\nf()\ndefault:\n}"),
                "{\n\tswitch x {\n\tcase 1, 2:\n\t\tf()\n\tdefault:\n\t}\n}"
            );
        }

        #[test]
        fn labels_are_outdented() {
            assert_eq!(
                render_body("outer:\nfor {\nbreak outer\n}"),
                "{\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}"
            );
        }

        #[test]
        fn declarations() {
            assert_eq!(render_body("var err error"), "{\n\tvar err error\n}");
            let tree = parse_file("package p\nfunc (r *T) M(x int) error { return nil }\n").expect("parse");
            assert_eq!(
                NodeRef::new(&tree, tree.root()).to_code(),
                "package p\n\nfunc (r *T) M(x int) error {\n\treturn nil\n}\n"
            );
        }
    }
}
