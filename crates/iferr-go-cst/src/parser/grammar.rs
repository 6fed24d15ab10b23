// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! PEG grammar for Go source files.
//!
//! The grammar runs over the token slice produced by [`crate::tokenizer`],
//! inserted semicolons included. Actions hand finished nodes to the
//! [`Builder`] arena.
//!
//! Expression rules take `h`, which is true inside the header of an `if`,
//! `for` or `switch`. There `T{` starts the statement body rather than a
//! composite literal. Any bracket resets it.

use super::builder::{Builder, RangeClause, Simple, Tail};
use crate::nodes::{ArrayLen, ChanDir, DeclKeyword, NodeId, NodeKind};
use crate::tokenizer::{Keyword, Op, TokType, Token};

peg::parser! {
pub grammar go<'s>(b: &Builder<'s>) for [Token] {

    // ========================================================================
    // Tokens
    // ========================================================================

    rule pos() -> usize = position!()

    // Token tests look before they consume, so a mismatch is reported at
    // the offending token rather than after it.
    rule peek() -> Token = p:pos() { b.token(p) }

    rule op(o: Op)
        = (t:peek() {? if t.typ == TokType::Op(o) { Ok(()) } else { Err(o.as_str()) } }) [_]

    rule kw(k: Keyword)
        = (t:peek() {? if t.typ == TokType::Keyword(k) { Ok(()) } else { Err(k.as_str()) } }) [_]

    rule semi() = (t:peek() {? if t.typ.is_semi() { Ok(()) } else { Err(";") } }) [_]

    rule semis() = semi()*

    rule eof() = (t:peek() {? if t.typ == TokType::Eof { Ok(()) } else { Err("EOF") } }) [_]

    rule ident() -> NodeId
        = t:(t:peek() {? if t.typ == TokType::Ident { Ok(t) } else { Err("identifier") } }) [_]
          { b.ident(t) }

    rule literal() -> NodeId
        = t:(t:peek() {? if t.typ.is_literal() { Ok(t) } else { Err("literal") } }) [_]
          {? b.literal(t).ok_or("literal") }

    rule string_lit() -> NodeId
        = t:(t:peek() {? if t.typ == TokType::String { Ok(t) } else { Err("string") } }) [_]
          {? b.literal(t).ok_or("string") }

    // ========================================================================
    // File and declarations
    // ========================================================================

    pub rule file() -> NodeId
        = s:pos() kw(Keyword::Package) package:ident() semi() semis()
          decls:(d:top_decl() (semi() semis() / &eof()) { d })* e:pos() eof()
          { b.push(NodeKind::File { package, decls }, s, e) }

    rule top_decl() -> NodeId = func_decl() / gen_decl()

    rule gen_decl() -> NodeId
        = s:pos() kw(Keyword::Import) g:specs(<import_spec()>) e:pos()
          { b.gen_decl(DeclKeyword::Import, g, s, e) }
        / s:pos() kw(Keyword::Const) g:specs(<value_spec()>) e:pos()
          { b.gen_decl(DeclKeyword::Const, g, s, e) }
        / s:pos() kw(Keyword::Var) g:specs(<value_spec()>) e:pos()
          { b.gen_decl(DeclKeyword::Var, g, s, e) }
        / s:pos() kw(Keyword::Type) g:specs(<type_spec()>) e:pos()
          { b.gen_decl(DeclKeyword::Type, g, s, e) }

    // A parenthesized group, or a single spec.
    rule specs(item: rule<NodeId>) -> (Vec<NodeId>, bool)
        = op(Op::LParen) semis() v:(x:item() (semi() semis() / &op(Op::RParen)) { x })* op(Op::RParen)
          { (v, true) }
        / x:item() { (vec![x], false) }

    rule import_spec() -> NodeId
        = s:pos() name:import_name()? path:string_lit() e:pos()
          { b.push(NodeKind::ImportSpec { name, path }, s, e) }

    rule import_name() -> NodeId
        = ident()
        / t:(t:peek() {? if t.typ == TokType::Op(Op::Dot) { Ok(t) } else { Err(".") } }) [_] { b.dot(t) }

    rule value_spec() -> NodeId
        = s:pos() names:(ident() ++ op(Op::Comma)) t:ty()? values:(op(Op::Assign) v:expr_list(false) { v })? e:pos()
          { b.push(NodeKind::ValueSpec { names, ty: t, values: values.unwrap_or_default() }, s, e) }

    rule type_spec() -> NodeId
        = s:pos() name:ident() type_params:type_params()? alias:(op(Op::Assign) { () })? t:ty() e:pos()
          { b.push(NodeKind::TypeSpec { name, type_params, alias: alias.is_some(), ty: t }, s, e) }

    rule func_decl() -> NodeId
        = s:pos() kw(Keyword::Func) recv:params()? name:ident() type_params:type_params()?
          ts:pos() t:signature(ts) body:block()? e:pos()
          { b.push(NodeKind::FuncDecl { recv, name, type_params, ty: t, body }, s, e) }

    // ========================================================================
    // Types
    // ========================================================================

    rule ty() -> NodeId
        = type_name()
        / s:pos() op(Op::Star) x:ty() e:pos() { b.push(NodeKind::Star { x }, s, e) }
        / s:pos() op(Op::LParen) x:ty() op(Op::RParen) e:pos() { b.push(NodeKind::Paren { x }, s, e) }
        / recv_chan()
        / array_type() / map_type() / chan_type() / func_type() / struct_type() / interface_type()

    rule type_name() -> NodeId
        = s:pos() name:ident() sel:(op(Op::Dot) i:ident() { i })? m:pos() args:type_args()? e:pos()
          { b.type_name(name, sel, args, (s, m, e)) }

    rule type_args() -> Vec<NodeId>
        = op(Op::LBracket) v:(ty() ++ op(Op::Comma)) op(Op::Comma)? op(Op::RBracket) { v }

    rule array_type() -> NodeId
        = s:pos() op(Op::LBracket) len:array_len() op(Op::RBracket) elem:ty() e:pos()
          { b.push(NodeKind::ArrayType { len, elem }, s, e) }

    rule array_len() -> ArrayLen
        = &op(Op::RBracket) { ArrayLen::Slice }
        / op(Op::Ellipsis) &op(Op::RBracket) { ArrayLen::Ellipsis }
        / n:expr(false) { ArrayLen::Expr(n) }

    rule map_type() -> NodeId
        = s:pos() kw(Keyword::Map) op(Op::LBracket) key:ty() op(Op::RBracket) value:ty() e:pos()
          { b.push(NodeKind::MapType { key, value }, s, e) }

    rule chan_type() -> NodeId
        = s:pos() kw(Keyword::Chan) op(Op::Arrow) elem:ty() e:pos()
          { b.push(NodeKind::ChanType { dir: ChanDir::Send, elem }, s, e) }
        / s:pos() kw(Keyword::Chan) elem:ty() e:pos()
          { b.push(NodeKind::ChanType { dir: ChanDir::Both, elem }, s, e) }

    rule recv_chan() -> NodeId
        = s:pos() op(Op::Arrow) kw(Keyword::Chan) elem:ty() e:pos()
          { b.push(NodeKind::ChanType { dir: ChanDir::Recv, elem }, s, e) }

    rule func_type() -> NodeId = s:pos() kw(Keyword::Func) t:signature(s) { t }

    // Parameters and results. The node starts at token `s`: the `func`
    // keyword of a literal or type, the parameter list of a declaration.
    rule signature(s: usize) -> NodeId
        = params:params() results:results()? e:pos()
          { b.push(NodeKind::FuncType { params, results }, s, e) }

    rule results() -> NodeId
        = params()
        / s:pos() t:ty() e:pos() { b.single_result(t, s, e) }

    rule params() -> NodeId
        = s:pos() op(Op::LParen) items:(param_item() ** op(Op::Comma)) op(Op::Comma)? op(Op::RParen) e:pos()
          { b.params(items, s, e) }

    // `[T any]`. A list without any constraint is an array length.
    rule type_params() -> NodeId
        = s:pos() op(Op::LBracket) items:(param_item() ++ op(Op::Comma)) op(Op::Comma)? op(Op::RBracket) e:pos()
          {?
            if items.iter().any(|(_, t)| t.is_some()) {
                Ok(b.params(items, s, e))
            } else {
                Err("type parameter")
            }
          }

    rule param_item() -> (NodeId, Option<NodeId>)
        = n:ident() t:param_type() { (n, Some(t)) }
        / t:param_type() { (t, None) }

    rule param_type() -> NodeId
        = s:pos() op(Op::Ellipsis) elem:ty() e:pos() { b.push(NodeKind::Ellipsis { elem }, s, e) }
        / constraint()

    // `~int | ~string`, or any plain type.
    rule constraint() -> NodeId
        = x:constraint_term() rest:(op(Op::Pipe) y:constraint_term() { (Op::Pipe, y) })*
          { b.binary(x, rest) }

    rule constraint_term() -> NodeId
        = s:pos() op(Op::Tilde) x:ty() e:pos() { b.push(NodeKind::Unary { op: Op::Tilde, x }, s, e) }
        / ty()

    rule field_end() = semi() semis() / &op(Op::RBrace)

    rule struct_type() -> NodeId
        = s:pos() kw(Keyword::Struct) ls:pos() op(Op::LBrace) semis()
          fields:(f:struct_field() field_end() { f })* op(Op::RBrace) e:pos()
          { b.braced_fields(fields, |fields| NodeKind::StructType { fields }, (s, ls, e)) }

    rule struct_field() -> NodeId
        = s:pos() names:(ident() ++ op(Op::Comma)) t:ty() tag:string_lit()? e:pos()
          { b.push(NodeKind::Field { names, ty: t, tag }, s, e) }
        / s:pos() t:embedded_field() tag:string_lit()? e:pos()
          { b.push(NodeKind::Field { names: Vec::new(), ty: t, tag }, s, e) }

    rule embedded_field() -> NodeId
        = s:pos() op(Op::Star) x:type_name() e:pos() { b.push(NodeKind::Star { x }, s, e) }
        / type_name()

    rule interface_type() -> NodeId
        = s:pos() kw(Keyword::Interface) ls:pos() op(Op::LBrace) semis()
          methods:(m:interface_elem() field_end() { m })* op(Op::RBrace) e:pos()
          { b.braced_fields(methods, |methods| NodeKind::InterfaceType { methods }, (s, ls, e)) }

    rule interface_elem() -> NodeId
        = s:pos() name:ident() ts:pos() t:signature(ts) e:pos()
          { b.push(NodeKind::Field { names: vec![name], ty: t, tag: None }, s, e) }
        / s:pos() t:constraint() e:pos()
          { b.push(NodeKind::Field { names: Vec::new(), ty: t, tag: None }, s, e) }

    // ========================================================================
    // Expressions
    // ========================================================================

    rule expr_list(h: bool) -> Vec<NodeId> = expr(h) ++ op(Op::Comma)

    rule expr(h: bool) -> NodeId
        = x:and_expr(h) rest:(o:binop(1) y:and_expr(h) { (o, y) })* { b.binary(x, rest) }

    rule and_expr(h: bool) -> NodeId
        = x:cmp_expr(h) rest:(o:binop(2) y:cmp_expr(h) { (o, y) })* { b.binary(x, rest) }

    rule cmp_expr(h: bool) -> NodeId
        = x:add_expr(h) rest:(o:binop(3) y:add_expr(h) { (o, y) })* { b.binary(x, rest) }

    rule add_expr(h: bool) -> NodeId
        = x:mul_expr(h) rest:(o:binop(4) y:mul_expr(h) { (o, y) })* { b.binary(x, rest) }

    rule mul_expr(h: bool) -> NodeId
        = x:unary(h) rest:(o:binop(5) y:unary(h) { (o, y) })* { b.binary(x, rest) }

    rule binop(prec: u8) -> Op
        = o:(t:peek() {?
            match t.typ {
                TokType::Op(o) if o.precedence() == prec => Ok(o),
                _ => Err("operator"),
            }
          }) [_] { o }

    rule unary(h: bool) -> NodeId
        = recv_chan()
        / s:pos() o:unary_op() x:unary(h) e:pos() { b.push(NodeKind::Unary { op: o, x }, s, e) }
        / s:pos() op(Op::Star) x:unary(h) e:pos() { b.push(NodeKind::Star { x }, s, e) }
        / primary(h)

    rule unary_op() -> Op
        = o:(t:peek() {?
            match t.typ {
                TokType::Op(o @ (Op::Plus | Op::Minus | Op::Not | Op::Caret | Op::Amp | Op::Tilde | Op::Arrow)) => Ok(o),
                _ => Err("expression"),
            }
          }) [_] { o }

    rule primary(h: bool) -> NodeId
        = s:pos() x:operand() r:suffixes(s, x, h)? { r.unwrap_or(x) }

    rule suffixes(s: usize, x: NodeId, h: bool) -> NodeId
        = y:suffix(s, x, h) r:suffixes(s, y, h)? { r.unwrap_or(y) }

    rule suffix(s: usize, x: NodeId, h: bool) -> NodeId
        = op(Op::Dot) sel:ident() e:pos()
          { b.push(NodeKind::Selector { x, sel }, s, e) }
        / op(Op::Dot) op(Op::LParen) kw(Keyword::Type) op(Op::RParen) e:pos()
          { b.push(NodeKind::TypeAssert { x, ty: None }, s, e) }
        / op(Op::Dot) op(Op::LParen) t:ty() op(Op::RParen) e:pos()
          { b.push(NodeKind::TypeAssert { x, ty: Some(t) }, s, e) }
        / op(Op::LParen) args:(expr(false) ** op(Op::Comma)) ellipsis:(op(Op::Ellipsis) { () })? op(Op::Comma)? op(Op::RParen) e:pos()
          { b.push(NodeKind::Call { fun: x, args, ellipsis: ellipsis.is_some() }, s, e) }
        / op(Op::LBracket) low:expr(false)? op(Op::Colon) high:expr(false)? max:(op(Op::Colon) m:expr(false) { m })? op(Op::RBracket) e:pos()
          { b.push(NodeKind::Slice { x, low, high, max }, s, e) }
        / op(Op::LBracket) indices:(expr(false) ++ op(Op::Comma)) op(Op::Comma)? op(Op::RBracket) e:pos()
          { b.push(NodeKind::Index { x, indices }, s, e) }
        / literal_allowed(x, h) elts:literal_body() e:pos()
          { b.push(NodeKind::CompositeLit { ty: Some(x), elts }, s, e) }

    rule literal_allowed(x: NodeId, h: bool)
        = &op(Op::LBrace) {? if b.literal_ok(x, h) { Ok(()) } else { Err("{") } }

    rule literal_body() -> Vec<NodeId>
        = op(Op::LBrace) elts:(element() ** op(Op::Comma)) op(Op::Comma)? op(Op::RBrace) { elts }

    rule element() -> NodeId
        = s:pos() key:element_value() value:(op(Op::Colon) v:element_value() { v })? e:pos()
          {
            match value {
                Some(value) => b.push(NodeKind::KeyValue { key, value }, s, e),
                None => key,
            }
          }

    rule element_value() -> NodeId
        = s:pos() elts:literal_body() e:pos() { b.push(NodeKind::CompositeLit { ty: None, elts }, s, e) }
        / expr(false)

    rule operand() -> NodeId
        = ident()
        / literal()
        / s:pos() op(Op::LParen) x:expr(false) op(Op::RParen) e:pos() { b.push(NodeKind::Paren { x }, s, e) }
        / s:pos() kw(Keyword::Func) t:signature(s) body:block()? e:pos() { b.func(t, body, s, e) }
        / array_type() / map_type() / chan_type() / struct_type() / interface_type()

    // ========================================================================
    // Statements
    // ========================================================================

    rule block() -> NodeId
        = s:pos() op(Op::LBrace) stmts:stmt_list() op(Op::RBrace) e:pos()
          { b.push(NodeKind::BlockStmt { stmts }, s, e) }

    rule stmt_list() -> Vec<NodeId>
        = semis() stmts:(st:stmt() (semi() semis() / &op(Op::RBrace)) { st })* { stmts }

    rule stmt() -> NodeId
        = s:pos() !kw(Keyword::Import) decl:gen_decl() e:pos() { b.push(NodeKind::DeclStmt { decl }, s, e) }
        / s:pos() kw(Keyword::Go) call:expr(false) e:pos() { b.push(NodeKind::GoStmt { call }, s, e) }
        / s:pos() kw(Keyword::Defer) call:expr(false) e:pos() { b.push(NodeKind::DeferStmt { call }, s, e) }
        / s:pos() kw(Keyword::Return) results:expr_list(false)? e:pos()
          { b.push(NodeKind::ReturnStmt { results: results.unwrap_or_default() }, s, e) }
        / s:pos() k:branch_kw() label:ident()? e:pos() { b.branch(k, label, s, e) }
        / block()
        / if_stmt()
        / switch_stmt()
        / select_stmt()
        / for_stmt()
        / s:pos() label:ident() op(Op::Colon) st:labeled_body() e:pos()
          { b.push(NodeKind::LabeledStmt { label, stmt: st }, s, e) }
        / c:simple(false) { b.finish(c) }

    rule branch_kw() -> Keyword
        = k:(t:peek() {?
            match t.typ {
                TokType::Keyword(k @ (Keyword::Break | Keyword::Continue | Keyword::Goto | Keyword::Fallthrough)) => Ok(k),
                _ => Err("statement"),
            }
          }) [_] { k }

    rule labeled_body() -> NodeId
        = stmt()
        / p:pos() &(semi() / op(Op::RBrace)) { b.empty_stmt(p) }

    rule simple(h: bool) -> Simple
        = s:pos() lhs:expr_list(h) t:tail(h)? e:pos() {? b.simple(lhs, t, s, e) }

    rule tail(h: bool) -> Tail
        = o:assign_op() rhs:expr_list(h) { Tail::Assign(o, rhs) }
        / op(Op::Arrow) value:expr(h) { Tail::Send(value) }
        / op(Op::Inc) { Tail::IncDec(true) }
        / op(Op::Dec) { Tail::IncDec(false) }

    rule assign_op() -> Op
        = o:(t:peek() {?
            match t.typ {
                TokType::Op(o) if o.is_assign() => Ok(o),
                _ => Err("assignment"),
            }
          }) [_] { o }

    rule if_stmt() -> NodeId
        = s:pos() kw(Keyword::If) head:simple(true)? cond:(semi() c:expr(true)? { c })? body:block()
          els:(kw(Keyword::Else) x:else_branch() { x })? e:pos()
          {? b.if_stmt(head, cond, (body, els), s, e) }

    rule else_branch() -> NodeId = if_stmt() / block()

    rule switch_stmt() -> NodeId
        = s:pos() kw(Keyword::Switch) head:simple(true)? tag:(semi() g:simple(true)? { g })? body:case_block() e:pos()
          {? b.switch_stmt(head, tag, body, s, e) }

    rule case_block() -> NodeId
        = s:pos() op(Op::LBrace) semis() clauses:case_clause()* op(Op::RBrace) e:pos()
          { b.push(NodeKind::BlockStmt { stmts: clauses }, s, e) }

    rule case_clause() -> NodeId
        = s:pos() kw(Keyword::Case) list:expr_list(false) op(Op::Colon) body:stmt_list() e:pos()
          { b.push(NodeKind::CaseClause { default: false, list, body }, s, e) }
        / s:pos() kw(Keyword::Default) op(Op::Colon) body:stmt_list() e:pos()
          { b.push(NodeKind::CaseClause { default: true, list: Vec::new(), body }, s, e) }

    rule select_stmt() -> NodeId
        = s:pos() kw(Keyword::Select) bs:pos() op(Op::LBrace) semis() clauses:comm_clause()* op(Op::RBrace) e:pos()
          { b.select_stmt(clauses, (s, bs, e)) }

    rule comm_clause() -> NodeId
        = s:pos() kw(Keyword::Case) c:simple(false) op(Op::Colon) body:stmt_list() e:pos()
          {
            let comm = Some(b.finish(c));
            b.push(NodeKind::CommClause { comm, body }, s, e)
          }
        / s:pos() kw(Keyword::Default) op(Op::Colon) body:stmt_list() e:pos()
          { b.push(NodeKind::CommClause { comm: None, body }, s, e) }

    rule for_stmt() -> NodeId
        = s:pos() kw(Keyword::For) r:range_clause() body:block() e:pos()
          { b.range_stmt(r, body, s, e) }
        / s:pos() kw(Keyword::For) init:simple(true)? semi() cond:expr(true)? semi() post:simple(true)? body:block() e:pos()
          { b.for_stmt((init, cond, post), body, s, e) }
        / s:pos() kw(Keyword::For) cond:expr(true)? body:block() e:pos()
          { b.for_stmt((None, cond, None), body, s, e) }

    rule range_clause() -> RangeClause
        = kw(Keyword::Range) x:expr(true)
          { RangeClause { key: None, value: None, op: None, x } }
        / key:expr(true) value:(op(Op::Comma) v:expr(true) { v })? o:range_op() kw(Keyword::Range) x:expr(true)
          { RangeClause { key: Some(key), value, op: Some(o), x } }

    rule range_op() -> Op
        = op(Op::Define) { Op::Define }
        / op(Op::Assign) { Op::Assign }
}
}
