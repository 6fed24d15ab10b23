//! Best-effort type checking.
//!
//! The checker declares every package-level object of every file before it
//! looks at any type or body, so results do not depend on file order. It
//! then records three kinds of facts in [`crate::program::Info`]:
//!
//! - identifier uses (`Ident` → object)
//! - member selections (`x.f` → field or method, with dispatch kind)
//! - scopes opened by declarations, blocks and clauses
//!
//! Anything it cannot make sense of (unknown names, failed imports, odd
//! expressions) is logged at `debug` and typed [`Type::Invalid`]. Checking
//! never fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use iferr_go_cst::{ArrayLen, DeclKeyword, LitKind, NodeId, NodeKind, Op, SourceTree};
use tracing::debug;

use crate::importer::Importer;
use crate::program::Program;
use crate::scope::{ScopeId, ScopeKind};
use crate::types::{
    BasicKind, DeclSite, FileId, FuncSig, InterfaceType, NamedId, ObjId, ObjKind, Object, PkgId,
    StructField, Type,
};

/// How much of a package to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Package-level declarations only. Used for imported packages.
    Declarations,
    /// Declarations and every function body.
    Full,
}

/// Check package `pkg`, whose files are already loaded into `prog`.
pub fn check_package(prog: &mut Program, importer: &mut Importer<'_>, pkg: PkgId, mode: CheckMode) {
    let mut checker = Checker {
        prog,
        importer,
        pkg,
        mode,
        file_scopes: HashMap::new(),
        defs: HashMap::new(),
        type_specs: Vec::new(),
        value_decls: Vec::new(),
        funcs: Vec::new(),
    };
    checker.collect();
    checker.resolve_type_specs();
    checker.resolve_funcs();
    checker.resolve_values();
    if mode == CheckMode::Full {
        checker.check_bodies();
    }
}

/// How the clauses of a switch body are checked.
enum Clauses {
    /// Expression switch and select: case lists are values.
    Values,
    /// Type switch: case lists are types, and the optional binding is
    /// redeclared in every clause.
    Types { binding: Option<NodeId>, subject: Type },
}

struct Checker<'p, 'i, 'c> {
    prog: &'p mut Program,
    importer: &'i mut Importer<'c>,
    pkg: PkgId,
    mode: CheckMode,
    file_scopes: HashMap<FileId, ScopeId>,
    /// Declaring identifier → object.
    defs: HashMap<(FileId, NodeId), ObjId>,
    type_specs: Vec<(FileId, NodeId, ObjId)>,
    value_decls: Vec<(FileId, NodeId)>,
    funcs: Vec<(FileId, NodeId, ObjId)>,
}

impl Checker<'_, '_, '_> {
    fn tree(&self, file: FileId) -> Rc<SourceTree> {
        Rc::clone(&self.prog.file(file).tree)
    }

    fn file_scope(&self, file: FileId) -> ScopeId {
        self.file_scopes
            .get(&file)
            .copied()
            .unwrap_or(self.prog.package(self.pkg).scope)
    }

    #[allow(clippy::too_many_arguments)]
    fn declare(
        &mut self,
        scope: ScopeId,
        f: FileId,
        t: &SourceTree,
        ident: NodeId,
        kind: ObjKind,
        ty: Type,
        visible_from: usize,
    ) -> ObjId {
        let name = t.ident_name(ident).unwrap_or("_").to_string();
        let obj = self.prog.new_object(Object {
            name: name.clone(),
            kind,
            ty,
            decl: Some(DeclSite { file: f, node: ident }),
            pkg: Some(self.pkg),
        });
        self.prog.scopes.insert(scope, &name, obj, visible_from);
        self.defs.insert((f, ident), obj);
        obj
    }

    fn open_scope(&mut self, f: FileId, parent: ScopeId, node: NodeId) -> ScopeId {
        let scope = self.prog.scopes.create(Some(parent), ScopeKind::Block);
        self.prog.info.scopes.insert((f, node), scope);
        scope
    }

    // ========================================================================
    // Package-level collection
    // ========================================================================

    fn collect(&mut self) {
        let pkg_scope = self.prog.package(self.pkg).scope;
        let files = self.prog.package(self.pkg).files.clone();
        for f in files {
            let t = self.tree(f);
            let file_scope = self.prog.scopes.create(Some(pkg_scope), ScopeKind::File);
            self.prog.info.scopes.insert((f, t.root()), file_scope);
            self.file_scopes.insert(f, file_scope);
            self.collect_imports(f, &t, file_scope);

            for &decl in t.decls() {
                match t.kind(decl) {
                    NodeKind::GenDecl {
                        keyword: DeclKeyword::Type,
                        specs,
                        ..
                    } => {
                        for &spec in specs {
                            if let Some(obj) = self.declare_type_spec(f, &t, pkg_scope, spec, 0) {
                                self.type_specs.push((f, spec, obj));
                            }
                        }
                    }
                    NodeKind::GenDecl {
                        keyword: keyword @ (DeclKeyword::Const | DeclKeyword::Var),
                        specs,
                        ..
                    } => {
                        let kind = if *keyword == DeclKeyword::Const {
                            ObjKind::Const
                        } else {
                            ObjKind::Var
                        };
                        for &spec in specs {
                            if let NodeKind::ValueSpec { names, .. } = t.kind(spec) {
                                for &name in names {
                                    self.declare(pkg_scope, f, &t, name, kind, Type::Invalid, 0);
                                }
                            }
                        }
                        self.value_decls.push((f, decl));
                    }
                    NodeKind::FuncDecl { recv, name, .. } => {
                        let func_name = t.ident_name(*name).unwrap_or("_").to_string();
                        let obj = self.prog.new_object(Object {
                            name: func_name.clone(),
                            kind: ObjKind::Func,
                            ty: Type::Invalid,
                            decl: Some(DeclSite { file: f, node: decl }),
                            pkg: Some(self.pkg),
                        });
                        if recv.is_none() && func_name != "init" {
                            self.prog.scopes.insert(pkg_scope, &func_name, obj, 0);
                        }
                        self.funcs.push((f, decl, obj));
                    }
                    _ => {}
                }
            }
        }
    }

    fn collect_imports(&mut self, f: FileId, t: &SourceTree, file_scope: ScopeId) {
        let dir: PathBuf = self
            .prog
            .file(f)
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for spec in t.imports() {
            let Some(path) = t.import_path(spec) else {
                continue;
            };
            let alias = match t.kind(spec) {
                NodeKind::ImportSpec { name, .. } => name.and_then(|n| t.ident_name(n)).map(str::to_string),
                _ => None,
            };
            if alias.as_deref() == Some("_") {
                continue;
            }
            let imported = match self.importer.import(self.prog, &path, &dir) {
                Ok(pkg) => pkg,
                Err(e) => {
                    debug!(import = %path, error = %e, "import failed");
                    continue;
                }
            };

            if alias.as_deref() == Some(".") {
                let scope = self.prog.package(imported).scope;
                let exported: Vec<(String, ObjId)> = self
                    .prog
                    .scopes
                    .names(scope)
                    .filter(|&(_, obj)| self.prog.object(obj).is_exported())
                    .map(|(name, obj)| (name.to_string(), obj))
                    .collect();
                for (name, obj) in exported {
                    self.prog.scopes.insert(file_scope, &name, obj, 0);
                }
                continue;
            }

            let name = alias.unwrap_or_else(|| self.prog.package(imported).name.clone());
            let obj = self.prog.new_object(Object {
                name: name.clone(),
                kind: ObjKind::PkgName(imported),
                ty: Type::Invalid,
                decl: Some(DeclSite { file: f, node: spec }),
                pkg: Some(self.pkg),
            });
            self.prog.scopes.insert(file_scope, &name, obj, 0);
        }
    }

    fn declare_type_spec(
        &mut self,
        f: FileId,
        t: &SourceTree,
        scope: ScopeId,
        spec: NodeId,
        visible_from: usize,
    ) -> Option<ObjId> {
        let NodeKind::TypeSpec { name, alias, .. } = t.kind(spec) else {
            return None;
        };
        let obj = self.declare(scope, f, t, *name, ObjKind::TypeName, Type::Invalid, visible_from);
        if !*alias {
            self.prog.new_named(obj, Type::Invalid);
        }
        Some(obj)
    }

    fn resolve_type_spec(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, spec: NodeId, obj: ObjId) {
        let NodeKind::TypeSpec {
            type_params, alias, ty, ..
        } = t.kind(spec)
        else {
            return;
        };
        let scope = match type_params {
            Some(params) => {
                let inner = self.prog.scopes.create(Some(scope), ScopeKind::Block);
                self.declare_type_params(f, t, inner, *params);
                inner
            }
            None => scope,
        };
        let resolved = self.resolve_type(f, t, scope, *ty);
        if *alias {
            self.prog.object_mut(obj).ty = resolved;
        } else if let Type::Named(id) = self.prog.object(obj).ty {
            self.prog.named_mut(id).underlying = resolved;
        }
    }

    fn declare_type_params(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, list: NodeId) {
        let NodeKind::FieldList { fields, .. } = t.kind(list) else {
            return;
        };
        for &field in fields {
            let NodeKind::Field { names, .. } = t.kind(field) else {
                continue;
            };
            for &name in names {
                self.declare(scope, f, t, name, ObjKind::TypeName, Type::TypeParam, 0);
            }
        }
    }

    fn resolve_type_specs(&mut self) {
        for (f, spec, obj) in std::mem::take(&mut self.type_specs) {
            let t = self.tree(f);
            let scope = self.file_scope(f);
            self.resolve_type_spec(f, &t, scope, spec, obj);
        }
    }

    fn resolve_funcs(&mut self) {
        let funcs = self.funcs.clone();
        for &(f, decl, obj) in &funcs {
            let t = self.tree(f);
            let NodeKind::FuncDecl {
                recv,
                type_params,
                ty,
                body,
                ..
            } = t.kind(decl)
            else {
                continue;
            };
            let file_scope = self.file_scope(f);
            let scope = self.prog.scopes.create(Some(file_scope), ScopeKind::Func);
            for node in [Some(decl), Some(*ty), *body].into_iter().flatten() {
                self.prog.info.scopes.insert((f, node), scope);
            }
            if let Some(params) = type_params {
                self.declare_type_params(f, &t, scope, *params);
            }
            if let Some(recv) = recv {
                match self.receiver_base(f, &t, scope, *recv) {
                    Some(base) => self.prog.named_mut(base).methods.push(obj),
                    None => debug!(method = %self.prog.object(obj).name, "receiver type not resolved"),
                }
            }
            let sig = self.func_sig(f, &t, scope, *ty);
            self.prog.object_mut(obj).ty = Type::Func(Rc::new(sig));
        }
    }

    /// Defined type a method is declared on. Receiver type parameters
    /// (`func (l *List[T])`) are declared in the method's scope.
    fn receiver_base(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, recv: NodeId) -> Option<NamedId> {
        let NodeKind::FieldList { fields, .. } = t.kind(recv) else {
            return None;
        };
        let NodeKind::Field { ty, .. } = t.kind(*fields.first()?) else {
            return None;
        };
        let mut base = t.unparen(*ty);
        if let NodeKind::Star { x } = t.kind(base) {
            base = t.unparen(*x);
        }
        if let NodeKind::Index { x, indices } = t.kind(base) {
            for &param in indices {
                if t.ident_name(param).is_some() {
                    self.declare(scope, f, t, param, ObjKind::TypeName, Type::TypeParam, 0);
                }
            }
            base = *x;
        }
        match self.resolve_type(f, t, scope, base) {
            Type::Named(id) => Some(id),
            _ => None,
        }
    }

    fn resolve_values(&mut self) {
        for (f, decl) in std::mem::take(&mut self.value_decls) {
            let t = self.tree(f);
            let scope = self.file_scope(f);
            self.value_decl(f, &t, scope, decl, false);
        }
    }

    /// Type the specs of a `const` or `var` declaration. Package-level
    /// objects already exist; local ones are declared here, each visible
    /// from the end of its spec.
    fn value_decl(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, decl: NodeId, local: bool) {
        let NodeKind::GenDecl { keyword, specs, .. } = t.kind(decl) else {
            return;
        };
        let (konst, kind) = match keyword {
            DeclKeyword::Const => (true, ObjKind::Const),
            DeclKeyword::Var => (false, ObjKind::Var),
            _ => return,
        };

        // A const spec without type or values repeats the previous one.
        let mut previous: Vec<Type> = Vec::new();
        for &spec in specs {
            let NodeKind::ValueSpec { names, ty, values } = t.kind(spec) else {
                continue;
            };
            let types = if let Some(ty) = ty {
                let declared = self.resolve_type(f, t, scope, *ty);
                for &value in values {
                    self.expr(f, t, scope, value);
                }
                vec![declared; names.len()]
            } else if konst && values.is_empty() {
                (0..names.len())
                    .map(|i| previous.get(i).or(previous.last()).cloned().unwrap_or(Type::Invalid))
                    .collect()
            } else {
                self.rhs_types(f, t, scope, values, names.len())
            };
            if konst {
                previous = types.clone();
            }

            let visible_from = t.span(spec).end;
            for (i, &name) in names.iter().enumerate() {
                let ty = types.get(i).cloned().unwrap_or(Type::Invalid);
                if local {
                    self.declare(scope, f, t, name, kind, ty, visible_from);
                } else if let Some(&obj) = self.defs.get(&(f, name)) {
                    self.prog.object_mut(obj).ty = ty;
                }
            }
        }
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    fn check_bodies(&mut self) {
        let funcs = self.funcs.clone();
        for &(f, decl, _) in &funcs {
            let t = self.tree(f);
            let NodeKind::FuncDecl {
                recv,
                ty,
                body: Some(body),
                ..
            } = t.kind(decl)
            else {
                continue;
            };
            let Some(&scope) = self.prog.info.scopes.get(&(f, decl)) else {
                continue;
            };
            if let Some(recv) = recv {
                self.declare_params(f, &t, scope, *recv);
            }
            self.declare_signature(f, &t, scope, *ty);
            if let NodeKind::BlockStmt { stmts } = t.kind(*body) {
                self.stmt_list(f, &t, scope, stmts);
            }
        }
    }

    fn declare_signature(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, func_type: NodeId) {
        if let NodeKind::FuncType { params, results } = t.kind(func_type) {
            self.declare_params(f, t, scope, *params);
            if let Some(results) = results {
                self.declare_params(f, t, scope, *results);
            }
        }
    }

    fn declare_params(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, list: NodeId) {
        let NodeKind::FieldList { fields, .. } = t.kind(list) else {
            return;
        };
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = t.kind(field) else {
                continue;
            };
            if names.is_empty() {
                continue;
            }
            let resolved = self.resolve_type(f, t, scope, *ty);
            for &name in names {
                self.declare(scope, f, t, name, ObjKind::Var, resolved.clone(), 0);
            }
        }
    }

    fn stmt_list(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, stmts: &[NodeId]) {
        for &stmt in stmts {
            self.stmt(f, t, scope, stmt);
        }
    }

    fn stmt(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, id: NodeId) {
        match t.kind(id) {
            NodeKind::DeclStmt { decl } => self.local_decl(f, t, scope, *decl),
            NodeKind::LabeledStmt { stmt, .. } => self.stmt(f, t, scope, *stmt),
            NodeKind::ExprStmt { x } | NodeKind::IncDecStmt { x, .. } => {
                self.expr(f, t, scope, *x);
            }
            NodeKind::GoStmt { call } | NodeKind::DeferStmt { call } => {
                self.expr(f, t, scope, *call);
            }
            NodeKind::SendStmt { chan, value } => {
                self.expr(f, t, scope, *chan);
                self.expr(f, t, scope, *value);
            }
            NodeKind::AssignStmt { lhs, op, rhs } => self.assign(f, t, scope, id, lhs, *op, rhs),
            NodeKind::ReturnStmt { results } => {
                for &result in results {
                    self.expr(f, t, scope, result);
                }
            }
            NodeKind::BlockStmt { stmts } => {
                let inner = self.open_scope(f, scope, id);
                self.stmt_list(f, t, inner, stmts);
            }
            NodeKind::IfStmt { init, cond, body, els } => {
                let inner = self.open_scope(f, scope, id);
                if let Some(init) = init {
                    self.stmt(f, t, inner, *init);
                }
                self.expr(f, t, inner, *cond);
                self.stmt(f, t, inner, *body);
                if let Some(els) = els {
                    self.stmt(f, t, inner, *els);
                }
            }
            NodeKind::SwitchStmt { init, tag, body } => {
                let inner = self.open_scope(f, scope, id);
                if let Some(init) = init {
                    self.stmt(f, t, inner, *init);
                }
                if let Some(tag) = tag {
                    self.expr(f, t, inner, *tag);
                }
                self.clauses(f, t, inner, *body, Clauses::Values);
            }
            NodeKind::TypeSwitchStmt { init, assign, body } => {
                let inner = self.open_scope(f, scope, id);
                if let Some(init) = init {
                    self.stmt(f, t, inner, *init);
                }
                let (binding, guard) = match t.kind(*assign) {
                    NodeKind::AssignStmt { lhs, rhs, .. } => (lhs.first().copied(), rhs.first().copied()),
                    NodeKind::ExprStmt { x } => (None, Some(*x)),
                    _ => (None, None),
                };
                let subject = match guard.map(|g| t.unparen(g)) {
                    Some(g) => match t.kind(g) {
                        NodeKind::TypeAssert { x, .. } => self.expr(f, t, inner, *x),
                        _ => self.expr(f, t, inner, g),
                    },
                    None => Type::Invalid,
                };
                self.clauses(f, t, inner, *body, Clauses::Types { binding, subject });
            }
            NodeKind::SelectStmt { body } => {
                let inner = self.open_scope(f, scope, id);
                self.clauses(f, t, inner, *body, Clauses::Values);
            }
            NodeKind::ForStmt { init, cond, post, body } => {
                let inner = self.open_scope(f, scope, id);
                if let Some(init) = init {
                    self.stmt(f, t, inner, *init);
                }
                if let Some(cond) = cond {
                    self.expr(f, t, inner, *cond);
                }
                if let Some(post) = post {
                    self.stmt(f, t, inner, *post);
                }
                self.stmt(f, t, inner, *body);
            }
            NodeKind::RangeStmt {
                key,
                value,
                op,
                x,
                body,
            } => {
                let inner = self.open_scope(f, scope, id);
                let range_ty = self.expr(f, t, scope, *x);
                let (key_ty, value_ty) = self.range_types(&range_ty);
                if *op == Some(Op::Define) {
                    let visible_from = t.span(*body).start;
                    for (node, ty) in [(*key, key_ty), (*value, value_ty)] {
                        if let Some(node) = node {
                            self.declare(inner, f, t, node, ObjKind::Var, ty, visible_from);
                        }
                    }
                } else {
                    for node in [key, value].into_iter().flatten() {
                        self.expr(f, t, inner, *node);
                    }
                }
                self.stmt(f, t, inner, *body);
            }
            _ => {}
        }
    }

    fn clauses(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, body: NodeId, mode: Clauses) {
        let NodeKind::BlockStmt { stmts } = t.kind(body) else {
            return;
        };
        for &clause in stmts {
            let inner = self.open_scope(f, scope, clause);
            match t.kind(clause) {
                NodeKind::CaseClause { list, body, .. } => {
                    match &mode {
                        Clauses::Values => {
                            for &value in list {
                                self.expr(f, t, scope, value);
                            }
                        }
                        Clauses::Types { binding, subject } => {
                            let mut types: Vec<Type> = Vec::new();
                            for &case in list {
                                if t.ident_name(case) == Some("nil") {
                                    types.push(subject.clone());
                                } else {
                                    types.push(self.resolve_type(f, t, scope, case));
                                }
                            }
                            if let Some(binding) = binding {
                                let ty = match types.as_slice() {
                                    [single] => single.clone(),
                                    _ => subject.clone(),
                                };
                                let visible_from = t.span(clause).start;
                                self.declare(inner, f, t, *binding, ObjKind::Var, ty, visible_from);
                            }
                        }
                    }
                    self.stmt_list(f, t, inner, body);
                }
                NodeKind::CommClause { comm, body } => {
                    if let Some(comm) = comm {
                        self.stmt(f, t, inner, *comm);
                    }
                    self.stmt_list(f, t, inner, body);
                }
                _ => self.stmt(f, t, inner, clause),
            }
        }
    }

    fn local_decl(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, decl: NodeId) {
        match t.kind(decl) {
            NodeKind::GenDecl {
                keyword: DeclKeyword::Type,
                specs,
                ..
            } => {
                for &spec in specs {
                    let NodeKind::TypeSpec { name, .. } = t.kind(spec) else {
                        continue;
                    };
                    let visible_from = t.span(*name).start;
                    if let Some(obj) = self.declare_type_spec(f, t, scope, spec, visible_from) {
                        self.resolve_type_spec(f, t, scope, spec, obj);
                    }
                }
            }
            NodeKind::GenDecl { .. } => self.value_decl(f, t, scope, decl, true),
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assign(
        &mut self,
        f: FileId,
        t: &SourceTree,
        scope: ScopeId,
        id: NodeId,
        lhs: &[NodeId],
        op: Op,
        rhs: &[NodeId],
    ) {
        if op != Op::Define {
            for &target in lhs {
                self.expr(f, t, scope, target);
            }
            for &value in rhs {
                self.expr(f, t, scope, value);
            }
            return;
        }

        let types = self.rhs_types(f, t, scope, rhs, lhs.len());
        let visible_from = t.span(id).end;
        for (i, &target) in lhs.iter().enumerate() {
            let Some(name) = t.ident_name(target) else {
                continue;
            };
            if name == "_" {
                continue;
            }
            // `:=` redeclares nothing that already lives in this scope.
            if let Some(existing) = self.prog.scopes.lookup_local(scope, name) {
                self.prog.info.uses.insert((f, target), existing);
                continue;
            }
            let ty = types.get(i).cloned().unwrap_or(Type::Invalid);
            self.declare(scope, f, t, target, ObjKind::Var, ty, visible_from);
        }
    }

    /// Types assigned to `n` targets from `rhs`, including the tuple and
    /// comma-ok forms.
    fn rhs_types(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, rhs: &[NodeId], n: usize) -> Vec<Type> {
        if let [single] = rhs {
            if n > 1 {
                return match self.expr(f, t, scope, *single) {
                    Type::Tuple(items) if items.len() == n => items.to_vec(),
                    Type::Tuple(_) => vec![Type::Invalid; n],
                    value if n == 2 => vec![value, Type::Basic(BasicKind::Bool)],
                    _ => vec![Type::Invalid; n],
                };
            }
        }
        rhs.iter().map(|&value| self.expr(f, t, scope, value)).collect()
    }

    fn range_types(&self, ty: &Type) -> (Type, Type) {
        let int = Type::Basic(BasicKind::Int);
        match self.prog.underlying(ty) {
            Type::Basic(BasicKind::String) => (int, Type::Basic(BasicKind::Int32)),
            Type::Basic(kind) if kind.is_integer() => (ty.clone(), Type::Invalid),
            Type::Slice(elem) | Type::Array(elem) => (int, *elem),
            Type::Pointer(elem) => match self.prog.underlying(&elem) {
                Type::Array(elem) => (int, *elem),
                _ => (Type::Invalid, Type::Invalid),
            },
            Type::Map(key, value) => (*key, *value),
            Type::Chan(elem) => (*elem, Type::Invalid),
            _ => (Type::Invalid, Type::Invalid),
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Resolve an identifier at its position and record the use.
    fn lookup(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, ident: NodeId) -> Option<ObjId> {
        let name = t.ident_name(ident)?;
        let (_, obj) = self.prog.scopes.lookup_parent(scope, name, t.span(ident).start)?;
        self.prog.info.uses.insert((f, ident), obj);
        Some(obj)
    }

    /// Package named by `x` when `x` is an import name.
    fn package_of(&self, t: &SourceTree, scope: ScopeId, x: NodeId) -> Option<PkgId> {
        let name = t.ident_name(x)?;
        let (_, obj) = self.prog.scopes.lookup_parent(scope, name, t.span(x).start)?;
        match self.prog.object(obj).kind {
            ObjKind::PkgName(pkg) => Some(pkg),
            _ => None,
        }
    }

    /// Resolve `pkg.sel`, recording the uses of both identifiers.
    fn qualified(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, x: NodeId, sel: NodeId) -> Option<ObjId> {
        let pkg = self.package_of(t, scope, x)?;
        self.lookup(f, t, scope, x);
        let name = t.ident_name(sel)?;
        let pkg_scope = self.prog.package(pkg).scope;
        let Some(obj) = self.prog.scopes.lookup_local(pkg_scope, name) else {
            debug!(package = %self.prog.package(pkg).path, name, "unresolved qualified identifier");
            return None;
        };
        self.prog.info.uses.insert((f, sel), obj);
        Some(obj)
    }

    /// Whether `id` denotes a type rather than a value. Records nothing.
    fn is_type_expr(&self, t: &SourceTree, scope: ScopeId, id: NodeId) -> bool {
        match t.kind(id) {
            NodeKind::Ident { name } => self
                .prog
                .scopes
                .lookup_parent(scope, name, t.span(id).start)
                .is_some_and(|(_, obj)| self.prog.object(obj).kind == ObjKind::TypeName),
            NodeKind::Selector { x, sel } => {
                let Some(pkg) = self.package_of(t, scope, *x) else {
                    return false;
                };
                let pkg_scope = self.prog.package(pkg).scope;
                t.ident_name(*sel)
                    .and_then(|name| self.prog.scopes.lookup_local(pkg_scope, name))
                    .is_some_and(|obj| self.prog.object(obj).kind == ObjKind::TypeName)
            }
            NodeKind::Paren { x } | NodeKind::Star { x } | NodeKind::Index { x, .. } => {
                self.is_type_expr(t, scope, *x)
            }
            NodeKind::ArrayType { .. }
            | NodeKind::MapType { .. }
            | NodeKind::ChanType { .. }
            | NodeKind::FuncType { .. }
            | NodeKind::StructType { .. }
            | NodeKind::InterfaceType { .. } => true,
            _ => false,
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn resolve_type(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, id: NodeId) -> Type {
        match t.kind(id) {
            NodeKind::Ident { name } => match self.lookup(f, t, scope, id) {
                Some(obj) if self.prog.object(obj).kind == ObjKind::TypeName => self.prog.object(obj).ty.clone(),
                Some(_) => {
                    debug!(name = %name, "not a type");
                    Type::Invalid
                }
                None => {
                    debug!(name = %name, "unresolved type name");
                    Type::Invalid
                }
            },
            NodeKind::Selector { x, sel } => match self.qualified(f, t, scope, *x, *sel) {
                Some(obj) if self.prog.object(obj).kind == ObjKind::TypeName => self.prog.object(obj).ty.clone(),
                _ => Type::Invalid,
            },
            NodeKind::Paren { x } => self.resolve_type(f, t, scope, *x),
            NodeKind::Star { x } => self.resolve_type(f, t, scope, *x).pointer_to(),
            NodeKind::Index { x, indices } => {
                for &arg in indices {
                    self.resolve_type(f, t, scope, arg);
                }
                self.resolve_type(f, t, scope, *x)
            }
            NodeKind::ArrayType { len, elem } => {
                let elem = Box::new(self.resolve_type(f, t, scope, *elem));
                match len {
                    ArrayLen::Slice => Type::Slice(elem),
                    ArrayLen::Ellipsis => Type::Array(elem),
                    ArrayLen::Expr(len) => {
                        self.expr(f, t, scope, *len);
                        Type::Array(elem)
                    }
                }
            }
            NodeKind::MapType { key, value } => {
                let key = self.resolve_type(f, t, scope, *key);
                let value = self.resolve_type(f, t, scope, *value);
                Type::Map(Box::new(key), Box::new(value))
            }
            NodeKind::ChanType { elem, .. } => Type::Chan(Box::new(self.resolve_type(f, t, scope, *elem))),
            NodeKind::Ellipsis { elem } => Type::Slice(Box::new(self.resolve_type(f, t, scope, *elem))),
            NodeKind::FuncType { .. } => Type::Func(Rc::new(self.func_sig(f, t, scope, id))),
            NodeKind::StructType { fields } => self.struct_type(f, t, scope, *fields),
            NodeKind::InterfaceType { methods } => self.interface_type(f, t, scope, *methods),
            _ => Type::Invalid,
        }
    }

    fn func_sig(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, func_type: NodeId) -> FuncSig {
        let NodeKind::FuncType { params, results } = t.kind(func_type) else {
            return FuncSig::default();
        };
        let (params, variadic) = self.field_types(f, t, scope, *params);
        let results = match results {
            Some(results) => self.field_types(f, t, scope, *results).0,
            None => Vec::new(),
        };
        FuncSig {
            params,
            results,
            variadic,
        }
    }

    /// One type per declared name (or per field, when unnamed), and whether
    /// the list ends in a variadic parameter.
    fn field_types(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, list: NodeId) -> (Vec<Type>, bool) {
        let NodeKind::FieldList { fields, .. } = t.kind(list) else {
            return (Vec::new(), false);
        };
        let mut types = Vec::new();
        let mut variadic = false;
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = t.kind(field) else {
                continue;
            };
            variadic = matches!(t.kind(*ty), NodeKind::Ellipsis { .. });
            let resolved = self.resolve_type(f, t, scope, *ty);
            for _ in 0..names.len().max(1) {
                types.push(resolved.clone());
            }
        }
        (types, variadic)
    }

    fn struct_type(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, list: NodeId) -> Type {
        let NodeKind::FieldList { fields, .. } = t.kind(list) else {
            return Type::Invalid;
        };
        let mut out = Vec::new();
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = t.kind(field) else {
                continue;
            };
            let resolved = self.resolve_type(f, t, scope, *ty);
            if names.is_empty() {
                out.push(StructField {
                    name: embedded_name(t, *ty).to_string(),
                    ty: resolved,
                    embedded: true,
                });
                continue;
            }
            for &name in names {
                out.push(StructField {
                    name: t.ident_name(name).unwrap_or("_").to_string(),
                    ty: resolved.clone(),
                    embedded: false,
                });
            }
        }
        Type::Struct(out.into())
    }

    fn interface_type(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, list: NodeId) -> Type {
        let NodeKind::FieldList { fields, .. } = t.kind(list) else {
            return Type::Invalid;
        };
        let mut iface = InterfaceType::default();
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = t.kind(field) else {
                continue;
            };
            match names.as_slice() {
                [name] => {
                    let sig = self.func_sig(f, t, scope, *ty);
                    let name = t.ident_name(*name).unwrap_or("_").to_string();
                    iface.methods.push((name, Rc::new(sig)));
                }
                // Embedded interface, or a constraint element such as `~int`.
                _ => {
                    let embedded = self.resolve_type(f, t, scope, *ty);
                    if !embedded.is_invalid() {
                        iface.embeds.push(embedded);
                    }
                }
            }
        }
        Type::Interface(Rc::new(iface))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, id: NodeId) -> Type {
        match t.kind(id) {
            NodeKind::Ident { name } => {
                if name == "_" {
                    return Type::Invalid;
                }
                let Some(obj) = self.lookup(f, t, scope, id) else {
                    debug!(name = %name, "unresolved identifier");
                    return Type::Invalid;
                };
                let object = self.prog.object(obj);
                match object.kind {
                    ObjKind::Builtin | ObjKind::PkgName(_) => Type::Invalid,
                    _ => object.ty.clone(),
                }
            }
            NodeKind::BasicLit { kind, .. } => Type::Basic(match kind {
                LitKind::Int => BasicKind::Int,
                LitKind::Float => BasicKind::Float64,
                LitKind::Imag => BasicKind::Complex128,
                LitKind::Char => BasicKind::Int32,
                LitKind::String => BasicKind::String,
            }),
            NodeKind::CompositeLit { ty, elts } => {
                let lit_ty = match ty {
                    Some(ty) => self.resolve_type(f, t, scope, *ty),
                    None => Type::Invalid,
                };
                let keyed_by_field = matches!(self.prog.underlying(&lit_ty), Type::Struct(_));
                for &elt in elts {
                    match t.kind(elt) {
                        NodeKind::KeyValue { key, value } => {
                            if !keyed_by_field {
                                self.expr(f, t, scope, *key);
                            }
                            self.expr(f, t, scope, *value);
                        }
                        _ => {
                            self.expr(f, t, scope, elt);
                        }
                    }
                }
                lit_ty
            }
            NodeKind::FuncLit { ty, body } => self.func_lit(f, t, scope, id, *ty, *body),
            NodeKind::Paren { x } => self.expr(f, t, scope, *x),
            NodeKind::Selector { x, sel } => self.selector(f, t, scope, id, *x, *sel),
            NodeKind::Index { x, indices } => {
                if self.is_type_expr(t, scope, *x) {
                    return self.resolve_type(f, t, scope, id);
                }
                let base = self.expr(f, t, scope, *x);
                for &index in indices {
                    if self.is_type_expr(t, scope, index) {
                        self.resolve_type(f, t, scope, index);
                    } else {
                        self.expr(f, t, scope, index);
                    }
                }
                match self.prog.underlying(&base) {
                    Type::Slice(elem) | Type::Array(elem) => *elem,
                    Type::Map(_, value) => *value,
                    Type::Basic(BasicKind::String) => Type::Basic(BasicKind::Uint8),
                    Type::Pointer(elem) => match self.prog.underlying(&elem) {
                        Type::Array(elem) => *elem,
                        _ => Type::Invalid,
                    },
                    // Instantiation of a generic function.
                    Type::Func(_) => base,
                    _ => Type::Invalid,
                }
            }
            NodeKind::Slice { x, low, high, max } => {
                let base = self.expr(f, t, scope, *x);
                for bound in [low, high, max].into_iter().flatten() {
                    self.expr(f, t, scope, *bound);
                }
                match self.prog.underlying(&base) {
                    Type::Array(elem) => Type::Slice(elem),
                    Type::Pointer(elem) => match self.prog.underlying(&elem) {
                        Type::Array(elem) => Type::Slice(elem),
                        _ => Type::Invalid,
                    },
                    Type::Slice(_) | Type::Basic(BasicKind::String) => base,
                    _ => Type::Invalid,
                }
            }
            NodeKind::TypeAssert { x, ty } => {
                self.expr(f, t, scope, *x);
                match ty {
                    Some(ty) => self.resolve_type(f, t, scope, *ty),
                    None => Type::Invalid,
                }
            }
            NodeKind::Call { fun, args, .. } => self.call(f, t, scope, *fun, args),
            NodeKind::Star { x } => {
                if self.is_type_expr(t, scope, *x) {
                    return self.resolve_type(f, t, scope, id);
                }
                let pointer = self.expr(f, t, scope, *x);
                match self.prog.underlying(&pointer) {
                    Type::Pointer(elem) => *elem,
                    _ => Type::Invalid,
                }
            }
            NodeKind::Unary { op, x } => {
                let operand = self.expr(f, t, scope, *x);
                match op {
                    Op::Amp => operand.pointer_to(),
                    Op::Arrow => match self.prog.underlying(&operand) {
                        Type::Chan(elem) => *elem,
                        _ => Type::Invalid,
                    },
                    Op::Not => Type::Basic(BasicKind::Bool),
                    _ => operand,
                }
            }
            NodeKind::Binary { op, x, y } => {
                let left = self.expr(f, t, scope, *x);
                let right = self.expr(f, t, scope, *y);
                match op {
                    Op::EqEq | Op::NotEq | Op::Lt | Op::LtEq | Op::Gt | Op::GtEq | Op::AndAnd | Op::OrOr => {
                        Type::Basic(BasicKind::Bool)
                    }
                    Op::Shl | Op::Shr => left,
                    // An untyped literal takes the type of the other operand.
                    _ if matches!(t.kind(t.unparen(*x)), NodeKind::BasicLit { .. }) => right,
                    _ => left,
                }
            }
            NodeKind::KeyValue { value, .. } => self.expr(f, t, scope, *value),
            NodeKind::ArrayType { .. }
            | NodeKind::MapType { .. }
            | NodeKind::ChanType { .. }
            | NodeKind::FuncType { .. }
            | NodeKind::StructType { .. }
            | NodeKind::InterfaceType { .. } => self.resolve_type(f, t, scope, id),
            _ => Type::Invalid,
        }
    }

    fn func_lit(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, id: NodeId, ty: NodeId, body: NodeId) -> Type {
        let inner = self.prog.scopes.create(Some(scope), ScopeKind::Func);
        for node in [id, ty, body] {
            self.prog.info.scopes.insert((f, node), inner);
        }
        let sig = self.func_sig(f, t, inner, ty);
        if self.mode == CheckMode::Full {
            self.declare_signature(f, t, inner, ty);
            if let NodeKind::BlockStmt { stmts } = t.kind(body) {
                self.stmt_list(f, t, inner, stmts);
            }
        }
        Type::Func(Rc::new(sig))
    }

    fn selector(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, id: NodeId, x: NodeId, sel: NodeId) -> Type {
        if self.package_of(t, scope, x).is_some() {
            return match self.qualified(f, t, scope, x, sel) {
                Some(obj) => match self.prog.object(obj).kind {
                    ObjKind::Var | ObjKind::Const | ObjKind::Func | ObjKind::TypeName => self.prog.object(obj).ty.clone(),
                    _ => Type::Invalid,
                },
                None => Type::Invalid,
            };
        }
        if self.is_type_expr(t, scope, x) {
            // Method expression `T.m`; its signature is never needed.
            self.resolve_type(f, t, scope, x);
            return Type::Invalid;
        }

        let receiver = self.expr(f, t, scope, x);
        let Some(name) = t.ident_name(sel) else {
            return Type::Invalid;
        };
        match self.prog.lookup_field_or_method(&receiver, name) {
            Some(selection) => {
                if let Some(method) = selection.obj {
                    self.prog.info.uses.insert((f, sel), method);
                }
                let ty = selection.ty.clone();
                self.prog.info.selections.insert((f, id), selection);
                ty
            }
            None => {
                if !receiver.is_invalid() {
                    debug!(name, "unresolved selector");
                }
                Type::Invalid
            }
        }
    }

    fn call(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, fun: NodeId, args: &[NodeId]) -> Type {
        let callee = t.unparen(fun);
        if self.is_type_expr(t, scope, callee) {
            for &arg in args {
                self.expr(f, t, scope, arg);
            }
            return self.resolve_type(f, t, scope, callee);
        }
        if t.ident_name(callee).is_some() {
            if let Some(obj) = self.lookup(f, t, scope, callee) {
                if self.prog.object(obj).kind == ObjKind::Builtin {
                    let name = self.prog.object(obj).name.clone();
                    return self.builtin(f, t, scope, &name, args);
                }
            }
        }

        let callee_ty = self.expr(f, t, scope, callee);
        for &arg in args {
            self.expr(f, t, scope, arg);
        }
        match self.prog.underlying(&callee_ty) {
            Type::Func(sig) => Type::call_result(&sig),
            _ => Type::Invalid,
        }
    }

    fn builtin(&mut self, f: FileId, t: &SourceTree, scope: ScopeId, name: &str, args: &[NodeId]) -> Type {
        if name == "new" || name == "make" {
            let ty = match args.first() {
                Some(&arg) => self.resolve_type(f, t, scope, arg),
                None => Type::Invalid,
            };
            for &arg in args.iter().skip(1) {
                self.expr(f, t, scope, arg);
            }
            return if name == "new" { ty.pointer_to() } else { ty };
        }

        let types: Vec<Type> = args.iter().map(|&arg| self.expr(f, t, scope, arg)).collect();
        match name {
            "len" | "cap" | "copy" => Type::Basic(BasicKind::Int),
            "append" | "min" | "max" => types.into_iter().next().unwrap_or(Type::Invalid),
            "complex" => Type::Basic(BasicKind::Complex128),
            "real" | "imag" => Type::Basic(BasicKind::Float64),
            "recover" => Type::Interface(Rc::new(InterfaceType::default())),
            _ => Type::Tuple(Rc::from(Vec::new())),
        }
    }
}

/// Field name of an embedded field: the type name without pointer,
/// package qualifier or type arguments.
fn embedded_name(t: &SourceTree, ty: NodeId) -> &str {
    match t.kind(ty) {
        NodeKind::Ident { name } => name.as_str(),
        NodeKind::Star { x } | NodeKind::Paren { x } | NodeKind::Index { x, .. } => embedded_name(t, *x),
        NodeKind::Selector { sel, .. } => t.ident_name(*sel).unwrap_or(""),
        _ => "",
    }
}

// ============================================================================
// Tests
// ============================================================================
