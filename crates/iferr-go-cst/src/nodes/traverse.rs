// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use super::{ArrayLen, NodeId, NodeKind, SourceTree};

impl SourceTree {
    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let opt = |out: &mut Vec<NodeId>, n: &Option<NodeId>| {
            if let Some(n) = n {
                out.push(*n);
            }
        };
        match self.kind(id) {
            NodeKind::File { package, decls } => {
                out.push(*package);
                out.extend(decls);
            }
            NodeKind::GenDecl { specs, .. } => out.extend(specs),
            NodeKind::ImportSpec { name, path } => {
                opt(&mut out, name);
                out.push(*path);
            }
            NodeKind::ValueSpec { names, ty, values } => {
                out.extend(names);
                opt(&mut out, ty);
                out.extend(values);
            }
            NodeKind::TypeSpec {
                name,
                type_params,
                ty,
                ..
            } => {
                out.push(*name);
                opt(&mut out, type_params);
                out.push(*ty);
            }
            NodeKind::FuncDecl {
                recv,
                name,
                type_params,
                ty,
                body,
            } => {
                opt(&mut out, recv);
                out.push(*name);
                opt(&mut out, type_params);
                out.push(*ty);
                opt(&mut out, body);
            }
            NodeKind::Ident { .. } | NodeKind::BasicLit { .. } | NodeKind::EmptyStmt => {}
            NodeKind::CompositeLit { ty, elts } => {
                opt(&mut out, ty);
                out.extend(elts);
            }
            NodeKind::FuncLit { ty, body } => {
                out.push(*ty);
                out.push(*body);
            }
            NodeKind::Paren { x } | NodeKind::Star { x } | NodeKind::Unary { x, .. } => {
                out.push(*x)
            }
            NodeKind::Selector { x, sel } => {
                out.push(*x);
                out.push(*sel);
            }
            NodeKind::Index { x, indices } => {
                out.push(*x);
                out.extend(indices);
            }
            NodeKind::Slice { x, low, high, max } => {
                out.push(*x);
                opt(&mut out, low);
                opt(&mut out, high);
                opt(&mut out, max);
            }
            NodeKind::TypeAssert { x, ty } => {
                out.push(*x);
                opt(&mut out, ty);
            }
            NodeKind::Call { fun, args, .. } => {
                out.push(*fun);
                out.extend(args);
            }
            NodeKind::Binary { x, y, .. } => {
                out.push(*x);
                out.push(*y);
            }
            NodeKind::KeyValue { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::ArrayType { len, elem } => {
                if let ArrayLen::Expr(len) = len {
                    out.push(*len);
                }
                out.push(*elem);
            }
            NodeKind::MapType { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::ChanType { elem, .. } | NodeKind::Ellipsis { elem } => out.push(*elem),
            NodeKind::FuncType { params, results } => {
                out.push(*params);
                opt(&mut out, results);
            }
            NodeKind::StructType { fields } => out.push(*fields),
            NodeKind::InterfaceType { methods } => out.push(*methods),
            NodeKind::FieldList { fields, .. } => out.extend(fields),
            NodeKind::Field { names, ty, tag } => {
                out.extend(names);
                out.push(*ty);
                opt(&mut out, tag);
            }
            NodeKind::DeclStmt { decl } => out.push(*decl),
            NodeKind::LabeledStmt { label, stmt } => {
                out.push(*label);
                out.push(*stmt);
            }
            NodeKind::ExprStmt { x } | NodeKind::IncDecStmt { x, .. } => out.push(*x),
            NodeKind::SendStmt { chan, value } => {
                out.push(*chan);
                out.push(*value);
            }
            NodeKind::AssignStmt { lhs, rhs, .. } => {
                out.extend(lhs);
                out.extend(rhs);
            }
            NodeKind::GoStmt { call } | NodeKind::DeferStmt { call } => out.push(*call),
            NodeKind::ReturnStmt { results } => out.extend(results),
            NodeKind::BranchStmt { label, .. } => opt(&mut out, label),
            NodeKind::BlockStmt { stmts } => out.extend(stmts),
            NodeKind::IfStmt {
                init,
                cond,
                body,
                els,
            } => {
                opt(&mut out, init);
                out.push(*cond);
                out.push(*body);
                opt(&mut out, els);
            }
            NodeKind::CaseClause { list, body, .. } => {
                out.extend(list);
                out.extend(body);
            }
            NodeKind::SwitchStmt { init, tag, body } => {
                opt(&mut out, init);
                opt(&mut out, tag);
                out.push(*body);
            }
            NodeKind::TypeSwitchStmt { init, assign, body } => {
                opt(&mut out, init);
                out.push(*assign);
                out.push(*body);
            }
            NodeKind::CommClause { comm, body } => {
                opt(&mut out, comm);
                out.extend(body);
            }
            NodeKind::SelectStmt { body } => out.push(*body),
            NodeKind::ForStmt {
                init,
                cond,
                post,
                body,
            } => {
                opt(&mut out, init);
                opt(&mut out, cond);
                opt(&mut out, post);
                out.push(*body);
            }
            NodeKind::RangeStmt {
                key,
                value,
                x,
                body,
                ..
            } => {
                opt(&mut out, key);
                opt(&mut out, value);
                out.push(*x);
                out.push(*body);
            }
        }
        out
    }

    /// Visit `id` and its descendants in pre-order. The callback returns
    /// `false` to skip a node's children.
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId) -> bool) {
        if visit(id) {
            for child in self.children(id) {
                self.walk(child, visit);
            }
        }
    }

    /// First descendant of `id` (pre-order, `id` included) matching `pred`.
    pub fn find_first(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut found = None;
        self.walk(id, &mut |n| {
            if found.is_some() {
                return false;
            }
            if pred(self.kind(n)) {
                found = Some(n);
                return false;
            }
            true
        });
        found
    }
}
