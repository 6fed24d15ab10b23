//! Replacement plans and their rendering.
//!
//! A plan is the list of statements that replace the subject span. Nodes
//! kept from the file (the call, assignment targets) are referenced by id
//! and rendered through [`NodeRef`]; everything synthesized is plain text.

use iferr_core::patch::Span;
use iferr_go_cst::{Codegen, CodegenState, NodeId, NodeRef, SourceTree};

/// One assignment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A target expression of the original statement.
    Node(NodeId),
    /// The failure identifier.
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStmt {
    /// Caller-supplied statement, emitted as written.
    Verbatim(String),
    Return(Vec<String>),
    /// `panic(<failure>)`
    Panic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStmt {
    /// The call as a statement on its own.
    Call,
    /// `targets = call` or `targets := call`.
    Assign { targets: Vec<Target>, define: bool },
    /// `var <failure> <failure type>`
    DeclareFailure,
    /// `if [targets op call; ]<failure> != nil { body }`
    Check {
        init: Option<(Vec<Target>, bool)>,
        body: Vec<BodyStmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPlan {
    /// Source span replaced by the plan.
    pub subject: Span,
    pub call: NodeId,
    pub failure_ident: String,
    pub failure_type: String,
    pub stmts: Vec<PlanStmt>,
}

impl ReplacementPlan {
    /// Text of the plan with the call spelled as in the source.
    ///
    /// The renderer drops comments, so the first rendering of the call is
    /// swapped for its original bytes.
    pub fn render(&self, tree: &SourceTree) -> String {
        let rendered = PlanRenderer { plan: self, tree }.to_code();
        let call = NodeRef::new(tree, self.call).to_code();
        rendered.replacen(&call, tree.text(self.call), 1)
    }
}

// ============================================================================
// Rendering
// ============================================================================

struct PlanRenderer<'a> {
    plan: &'a ReplacementPlan,
    tree: &'a SourceTree,
}

impl PlanRenderer<'_> {
    fn targets(&self, targets: &[Target], define: bool, state: &mut CodegenState) {
        for (i, target) in targets.iter().enumerate() {
            if i > 0 {
                state.add_token(", ");
            }
            match target {
                Target::Node(id) => NodeRef::new(self.tree, *id).codegen(state),
                Target::Failure => state.add_token(&self.plan.failure_ident),
            }
        }
        state.add_token(if define { " := " } else { " = " });
        NodeRef::new(self.tree, self.plan.call).codegen(state);
    }

    fn body_stmt(&self, stmt: &BodyStmt, state: &mut CodegenState) {
        match stmt {
            BodyStmt::Verbatim(text) => state.add_token(text),
            BodyStmt::Return(values) => {
                state.add_token("return");
                if !values.is_empty() {
                    state.add_token(" ");
                    state.add_token(&values.join(", "));
                }
            }
            BodyStmt::Panic => {
                state.add_token("panic(");
                state.add_token(&self.plan.failure_ident);
                state.add_token(")");
            }
        }
    }

    fn stmt(&self, stmt: &PlanStmt, state: &mut CodegenState) {
        match stmt {
            PlanStmt::Call => NodeRef::new(self.tree, self.plan.call).codegen(state),
            PlanStmt::Assign { targets, define } => self.targets(targets, *define, state),
            PlanStmt::DeclareFailure => {
                state.add_token("var ");
                state.add_token(&self.plan.failure_ident);
                state.add_token(" ");
                state.add_token(&self.plan.failure_type);
            }
            PlanStmt::Check { init, body } => {
                state.add_token("if ");
                if let Some((targets, define)) = init {
                    self.targets(targets, *define, state);
                    state.add_token("; ");
                }
                state.add_token(&self.plan.failure_ident);
                state.add_token(" != nil {");
                state.indent();
                for stmt in body {
                    state.add_newline();
                    state.add_indent();
                    self.body_stmt(stmt, state);
                }
                state.dedent();
                state.add_newline();
                state.add_indent();
                state.add_token("}");
            }
        }
    }
}

impl Codegen for PlanRenderer<'_> {
    fn codegen(&self, state: &mut CodegenState) {
        for (i, stmt) in self.plan.stmts.iter().enumerate() {
            if i > 0 {
                state.add_newline();
                state.add_indent();
            }
            self.stmt(stmt, state);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use iferr_go_cst::{parse_file, NodeKind};

    const SOURCE: &str = "package main\n\nfunc f() (int, error) {\n\tn, _ := g(1, /* one */ 2)\n\treturn n, nil\n}\n";

    fn fixture() -> (SourceTree, NodeId, Vec<NodeId>) {
        let tree = parse_file(SOURCE).unwrap();
        let at = SOURCE.find("g(").unwrap();
        let call = tree.find_first(tree.root(), |k| matches!(k, NodeKind::Call { .. })).unwrap();
        assert_eq!(tree.span(call).start, at);
        let assign = tree
            .find_first(tree.root(), |k| matches!(k, NodeKind::AssignStmt { .. }))
            .unwrap();
        let NodeKind::AssignStmt { lhs, .. } = tree.kind(assign) else {
            unreachable!();
        };
        let lhs = lhs.clone();
        (tree, call, lhs)
    }

    fn plan(call: NodeId, stmts: Vec<PlanStmt>) -> ReplacementPlan {
        ReplacementPlan {
            subject: Span::new(0, 0),
            call,
            failure_ident: "err".to_string(),
            failure_type: "error".to_string(),
            stmts,
        }
    }

    #[test]
    fn check_with_initializer_keeps_call_comments() {
        let (tree, call, lhs) = fixture();
        let p = plan(
            call,
            vec![PlanStmt::Check {
                init: Some((vec![Target::Node(lhs[0]), Target::Failure], true)),
                body: vec![BodyStmt::Return(vec!["0".to_string(), "err".to_string()])],
            }],
        );
        assert_eq!(
            p.render(&tree),
            "if n, err := g(1, /* one */ 2); err != nil {\n\treturn 0, err\n}"
        );
    }

    #[test]
    fn declaration_then_check() {
        let (tree, call, lhs) = fixture();
        let p = plan(
            call,
            vec![
                PlanStmt::DeclareFailure,
                PlanStmt::Check {
                    init: Some((vec![Target::Node(lhs[0]), Target::Failure], false)),
                    body: vec![BodyStmt::Verbatim("log.Println(err)".to_string()), BodyStmt::Panic],
                },
            ],
        );
        assert_eq!(
            p.render(&tree),
            "var err error\nif n, err = g(1, /* one */ 2); err != nil {\n\tlog.Println(err)\n\tpanic(err)\n}"
        );
    }

    #[test]
    fn assignment_then_bare_check() {
        let (tree, call, lhs) = fixture();
        let p = plan(
            call,
            vec![
                PlanStmt::Assign {
                    targets: vec![Target::Node(lhs[0]), Target::Failure],
                    define: true,
                },
                PlanStmt::Check {
                    init: None,
                    body: vec![BodyStmt::Return(Vec::new())],
                },
            ],
        );
        assert_eq!(
            p.render(&tree),
            "n, err := g(1, /* one */ 2)\nif err != nil {\n\treturn\n}"
        );
    }

    #[test]
    fn bare_call() {
        let (tree, call, _) = fixture();
        assert_eq!(plan(call, vec![PlanStmt::Call]).render(&tree), "g(1, /* one */ 2)");
    }
}
