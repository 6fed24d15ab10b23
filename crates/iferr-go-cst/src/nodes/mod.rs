// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena syntax tree for Go source files.
//!
//! # Node Identity
//!
//! Every node lives in the [`SourceTree`] arena and is addressed by a
//! [`NodeId`]. Nodes refer to their children by id; there are no parent
//! pointers. Upward questions ("which function encloses this call?") are
//! answered from a node path computed per request, see
//! [`crate::visitor::position_lookup`].
//!
//! NodeIds are assigned as nodes complete, so a child always has a lower id
//! than its parent and the root is the last node in the arena.
//!
//! # Spans
//!
//! Each node carries the byte span of its source text. Children's spans are
//! disjoint and appear in source order in [`SourceTree::children`], which is
//! what makes the smallest-enclosing-node search a simple descent.

mod traverse;

pub use iferr_core::patch::Span;

use crate::tokenizer::{Comment, Keyword, Op};

// ============================================================================
// Node Identity
// ============================================================================

/// Index of a node in its [`SourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Node Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    /// `[]T`
    Slice,
    /// `[...]T`
    Ellipsis,
    /// `[N]T`
    Expr(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Import,
    Const,
    Type,
    Var,
}

impl DeclKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKeyword::Import => "import",
            DeclKeyword::Const => "const",
            DeclKeyword::Type => "type",
            DeclKeyword::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    // ---- file and declarations ----
    File {
        package: NodeId,
        decls: Vec<NodeId>,
    },
    GenDecl {
        keyword: DeclKeyword,
        specs: Vec<NodeId>,
        grouped: bool,
    },
    ImportSpec {
        name: Option<NodeId>,
        path: NodeId,
    },
    ValueSpec {
        names: Vec<NodeId>,
        ty: Option<NodeId>,
        values: Vec<NodeId>,
    },
    TypeSpec {
        name: NodeId,
        type_params: Option<NodeId>,
        alias: bool,
        ty: NodeId,
    },
    /// `ty` is the FuncType of the parameters and results; its span starts
    /// at the parameter list, not at the `func` keyword.
    FuncDecl {
        recv: Option<NodeId>,
        name: NodeId,
        type_params: Option<NodeId>,
        ty: NodeId,
        body: Option<NodeId>,
    },

    // ---- expressions ----
    Ident {
        name: String,
    },
    BasicLit {
        kind: LitKind,
        value: String,
    },
    CompositeLit {
        ty: Option<NodeId>,
        elts: Vec<NodeId>,
    },
    FuncLit {
        ty: NodeId,
        body: NodeId,
    },
    Paren {
        x: NodeId,
    },
    Selector {
        x: NodeId,
        sel: NodeId,
    },
    Index {
        x: NodeId,
        indices: Vec<NodeId>,
    },
    Slice {
        x: NodeId,
        low: Option<NodeId>,
        high: Option<NodeId>,
        max: Option<NodeId>,
    },
    /// `x.(T)`, or `x.(type)` in a type switch when `ty` is `None`.
    TypeAssert {
        x: NodeId,
        ty: Option<NodeId>,
    },
    Call {
        fun: NodeId,
        args: Vec<NodeId>,
        ellipsis: bool,
    },
    /// Pointer type or dereference.
    Star {
        x: NodeId,
    },
    Unary {
        op: Op,
        x: NodeId,
    },
    Binary {
        op: Op,
        x: NodeId,
        y: NodeId,
    },
    KeyValue {
        key: NodeId,
        value: NodeId,
    },

    // ---- types ----
    ArrayType {
        len: ArrayLen,
        elem: NodeId,
    },
    MapType {
        key: NodeId,
        value: NodeId,
    },
    ChanType {
        dir: ChanDir,
        elem: NodeId,
    },
    FuncType {
        params: NodeId,
        results: Option<NodeId>,
    },
    StructType {
        fields: NodeId,
    },
    InterfaceType {
        methods: NodeId,
    },
    /// Variadic parameter type `...T`.
    Ellipsis {
        elem: NodeId,
    },
    /// Parameters, results, type parameters, struct fields or interface
    /// elements. `delimited` is false only for a single unparenthesized
    /// result type.
    FieldList {
        fields: Vec<NodeId>,
        delimited: bool,
    },
    Field {
        names: Vec<NodeId>,
        ty: NodeId,
        tag: Option<NodeId>,
    },

    // ---- statements ----
    DeclStmt {
        decl: NodeId,
    },
    EmptyStmt,
    LabeledStmt {
        label: NodeId,
        stmt: NodeId,
    },
    ExprStmt {
        x: NodeId,
    },
    SendStmt {
        chan: NodeId,
        value: NodeId,
    },
    IncDecStmt {
        x: NodeId,
        inc: bool,
    },
    AssignStmt {
        lhs: Vec<NodeId>,
        op: Op,
        rhs: Vec<NodeId>,
    },
    GoStmt {
        call: NodeId,
    },
    DeferStmt {
        call: NodeId,
    },
    ReturnStmt {
        results: Vec<NodeId>,
    },
    BranchStmt {
        keyword: Keyword,
        label: Option<NodeId>,
    },
    BlockStmt {
        stmts: Vec<NodeId>,
    },
    IfStmt {
        init: Option<NodeId>,
        cond: NodeId,
        body: NodeId,
        els: Option<NodeId>,
    },
    /// `case a, b:` or `default:` (when `default` is set, `list` is empty).
    CaseClause {
        default: bool,
        list: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    SwitchStmt {
        init: Option<NodeId>,
        tag: Option<NodeId>,
        body: NodeId,
    },
    TypeSwitchStmt {
        init: Option<NodeId>,
        assign: NodeId,
        body: NodeId,
    },
    /// `case <comm>:` or `default:` when `comm` is `None`.
    CommClause {
        comm: Option<NodeId>,
        body: Vec<NodeId>,
    },
    SelectStmt {
        body: NodeId,
    },
    ForStmt {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    RangeStmt {
        key: Option<NodeId>,
        value: Option<NodeId>,
        /// `:=` or `=`, `None` for `for range x`.
        op: Option<Op>,
        x: NodeId,
        body: NodeId,
    },
}

impl NodeKind {
    /// Short human-readable description, used in diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            NodeKind::File { .. } => "source file",
            NodeKind::GenDecl { .. } => "declaration",
            NodeKind::ImportSpec { .. } => "import",
            NodeKind::ValueSpec { .. } => "value specification",
            NodeKind::TypeSpec { .. } => "type specification",
            NodeKind::FuncDecl { .. } => "function declaration",
            NodeKind::Ident { .. } => "identifier",
            NodeKind::BasicLit { .. } => "literal",
            NodeKind::CompositeLit { .. } => "composite literal",
            NodeKind::FuncLit { .. } => "function literal",
            NodeKind::Paren { .. } => "parenthesized expression",
            NodeKind::Selector { .. } => "selector",
            NodeKind::Index { .. } => "index expression",
            NodeKind::Slice { .. } => "slice expression",
            NodeKind::TypeAssert { .. } => "type assertion",
            NodeKind::Call { .. } => "function call",
            NodeKind::Star { .. } => "pointer or dereference",
            NodeKind::Unary { .. } => "unary expression",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::KeyValue { .. } => "key/value pair",
            NodeKind::ArrayType { .. } => "array or slice type",
            NodeKind::MapType { .. } => "map type",
            NodeKind::ChanType { .. } => "channel type",
            NodeKind::FuncType { .. } => "function type",
            NodeKind::StructType { .. } => "struct type",
            NodeKind::InterfaceType { .. } => "interface type",
            NodeKind::Ellipsis { .. } => "variadic type",
            NodeKind::FieldList { .. } => "field list",
            NodeKind::Field { .. } => "field",
            NodeKind::DeclStmt { .. } => "declaration statement",
            NodeKind::EmptyStmt => "empty statement",
            NodeKind::LabeledStmt { .. } => "labeled statement",
            NodeKind::ExprStmt { .. } => "expression statement",
            NodeKind::SendStmt { .. } => "send statement",
            NodeKind::IncDecStmt { .. } => "increment statement",
            NodeKind::AssignStmt { .. } => "assignment",
            NodeKind::GoStmt { .. } => "go statement",
            NodeKind::DeferStmt { .. } => "defer statement",
            NodeKind::ReturnStmt { .. } => "return statement",
            NodeKind::BranchStmt { .. } => "branch statement",
            NodeKind::BlockStmt { .. } => "block",
            NodeKind::IfStmt { .. } => "if statement",
            NodeKind::CaseClause { .. } => "case clause",
            NodeKind::SwitchStmt { .. } => "switch statement",
            NodeKind::TypeSwitchStmt { .. } => "type switch statement",
            NodeKind::CommClause { .. } => "select case",
            NodeKind::SelectStmt { .. } => "select statement",
            NodeKind::ForStmt { .. } => "for loop",
            NodeKind::RangeStmt { .. } => "range loop",
        }
    }

    pub fn is_stmt(&self) -> bool {
        matches!(
            self,
            NodeKind::DeclStmt { .. }
                | NodeKind::EmptyStmt
                | NodeKind::LabeledStmt { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::SendStmt { .. }
                | NodeKind::IncDecStmt { .. }
                | NodeKind::AssignStmt { .. }
                | NodeKind::GoStmt { .. }
                | NodeKind::DeferStmt { .. }
                | NodeKind::ReturnStmt { .. }
                | NodeKind::BranchStmt { .. }
                | NodeKind::BlockStmt { .. }
                | NodeKind::IfStmt { .. }
                | NodeKind::CaseClause { .. }
                | NodeKind::SwitchStmt { .. }
                | NodeKind::TypeSwitchStmt { .. }
                | NodeKind::CommClause { .. }
                | NodeKind::SelectStmt { .. }
                | NodeKind::ForStmt { .. }
                | NodeKind::RangeStmt { .. }
        )
    }

    /// Function declarations and literals: the nodes that own a signature.
    pub fn is_func(&self) -> bool {
        matches!(self, NodeKind::FuncDecl { .. } | NodeKind::FuncLit { .. })
    }
}

// ============================================================================
// Source Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Immutable syntax tree of one file.
#[derive(Debug, Clone)]
pub struct SourceTree {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
    comments: Vec<Comment>,
}

impl SourceTree {
    pub(crate) fn new(source: String, nodes: Vec<Node>, root: NodeId, comments: Vec<Comment>) -> Self {
        SourceTree {
            source,
            nodes,
            root,
            comments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Arena size. Nodes left by abandoned parse alternatives count too,
    /// though nothing reachable from the root refers to them.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// Original source text of a node.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        &self.source[span.start..span.end]
    }

    /// Name of an identifier node, `None` for any other node.
    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren { x } = self.kind(id) {
            id = *x;
        }
        id
    }

    /// Package name from the `package` clause.
    pub fn package_name(&self) -> &str {
        match self.kind(self.root) {
            NodeKind::File { package, .. } => self.ident_name(*package).unwrap_or(""),
            _ => "",
        }
    }

    /// Top-level declarations in source order.
    pub fn decls(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::File { decls, .. } => decls,
            _ => &[],
        }
    }

    /// Import specs in source order.
    pub fn imports(&self) -> Vec<NodeId> {
        self.decls()
            .iter()
            .filter_map(|&decl| match self.kind(decl) {
                NodeKind::GenDecl {
                    keyword: DeclKeyword::Import,
                    specs,
                    ..
                } => Some(specs.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Unquoted import path of an import spec.
    pub fn import_path(&self, spec: NodeId) -> Option<String> {
        match self.kind(spec) {
            NodeKind::ImportSpec { path, .. } => match self.kind(*path) {
                NodeKind::BasicLit { value, .. } => Some(unquote(value)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Strip the quotes of a Go string literal. Escapes are left as written.
pub fn unquote(literal: &str) -> String {
    let trimmed = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')));
    trimmed.unwrap_or(literal).to_string()
}
