//! The if-err expansion.
//!
//! Rewrites the call under the cursor so that its failure result is checked
//! and propagated:
//!
//! 1. Parse the file and find the call at the position
//! 2. Check the file on its own and resolve both signatures: the enclosing
//!    function's and the callee's
//! 3. When the callee cannot be resolved, load the other files of the
//!    package and try once more
//! 4. Build the replacement plan from the callee's result count and the
//!    shape of the surrounding assignment
//! 5. Splice the rendered plan into the source and re-format the file
//!
//! See [`expand_source`] for the main entry point.

use std::path::{Path, PathBuf};

use iferr_core::output::{Location, Warning};
use iferr_core::patch::{LineEdit, Span};
use iferr_core::text::{byte_offset_to_position, span_to_line_range};
use iferr_go_cst::{
    parse_file, prettify_error, reformat, DeclKeyword, NodeId, NodeKind, NodePath, Op, ParserError,
    ReformatError, SourceTree,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checker::{check_package, CheckMode};
use crate::files::{read_file, sibling_files, FileError};
use crate::importer::{BuildContext, Importer};
use crate::lookup::{locate_call, CallSite, LookupError};
use crate::ops::plan::{BodyStmt, PlanStmt, ReplacementPlan, Target};
use crate::program::Program;
use crate::signature::{
    callee_signature, enclosing_function, EnclosingFunction, Signature, SignatureError,
};
use crate::types::FileId;
use crate::zero::zero_value;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during an expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// The file does not parse.
    #[error("parse error at {file}:{line}:{col}: {message}")]
    Parse {
        file: String,
        line: u32,
        col: u32,
        message: String,
        /// Annotated source excerpt.
        snippet: String,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// A multi-result call outside an assignment.
    #[error("call returns {results} values but is not part of an assignment")]
    NoAssignmentFound { results: usize },

    /// A malformed option value.
    #[error("invalid option: {message}")]
    InvalidOption { message: String },

    #[error(transparent)]
    Reformat(#[from] ReformatError),

    #[error("file error: {0}")]
    File(#[from] FileError),
}

impl ExpandError {
    fn parse(path: &Path, source: &str, err: &ParserError) -> Self {
        let file = path.display().to_string();
        let (line, col) = byte_offset_to_position(source.as_bytes(), err.span().start);
        ExpandError::Parse {
            snippet: prettify_error(err, source, &file),
            file,
            line,
            col,
            message: err.to_string(),
        }
    }
}

/// Result type for expansions.
pub type ExpandResult<T> = Result<T, ExpandError>;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Name the failure value is bound to.
    pub failure_ident: String,
    /// Name of the failure type; results of this type carry the failure.
    pub failure_type: String,
    /// Statement placed first in every failure branch.
    pub on_error: Option<String>,
    /// Panic in functions that cannot return the failure.
    pub panic_fallback: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            failure_ident: "err".to_string(),
            failure_type: "error".to_string(),
            on_error: None,
            panic_fallback: false,
        }
    }
}

impl ExpandOptions {
    /// Check that the names are identifiers and that `on_error` is a
    /// statement list.
    pub fn validate(&self) -> ExpandResult<()> {
        let invalid = |message: String| ExpandError::InvalidOption { message };
        for (what, name) in [
            ("failure identifier", &self.failure_ident),
            ("failure type", &self.failure_type),
        ] {
            if !is_identifier(name) {
                return Err(invalid(format!("{} {:?} is not an identifier", what, name)));
            }
        }
        if let Some(stmt) = &self.on_error {
            let wrapped = format!("package p\n\nfunc _() {{\n{}\n}}\n", stmt);
            let tree = parse_file(&wrapped)
                .map_err(|e| invalid(format!("on-error statement {:?}: {}", stmt, e)))?;
            if tree.decls().len() != 1 || stmt.trim().is_empty() {
                return Err(invalid(format!("on-error statement {:?} is not a statement list", stmt)));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well && chars.all(|c| c.is_alphanumeric() || c == '_') && name != "_"
}

// ============================================================================
// Output
// ============================================================================

/// A completed expansion.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The whole file after the expansion, re-formatted.
    pub formatted: String,
    /// Span of the original source that was replaced.
    pub subject: Span,
    /// The change as a line edit of the original.
    pub edit: LineEdit,
    pub warnings: Vec<Warning>,
}

// ============================================================================
// Analysis
// ============================================================================

/// The checked package around the file being expanded.
struct Analysis {
    prog: Program,
    file: FileId,
}

impl Analysis {
    fn load(path: &Path, tree: SourceTree, siblings: Vec<(PathBuf, SourceTree)>, ctx: &BuildContext) -> Self {
        let mut importer = Importer::new(ctx);
        let mut prog = Program::new();
        let name = tree.package_name().to_string();
        let pkg = prog.add_package(&name, &name);
        let file = prog.add_file(pkg, path.to_path_buf(), tree);
        for (sibling, tree) in siblings {
            prog.add_file(pkg, sibling, tree);
        }
        check_package(&mut prog, &mut importer, pkg, CheckMode::Full);
        Analysis { prog, file }
    }

    fn tree(&self) -> &SourceTree {
        &self.prog.file(self.file).tree
    }

    /// Reload with the other files of the package.
    fn escalate(self, path: &Path, ctx: &BuildContext) -> ExpandResult<Analysis> {
        let tree = self.tree().clone();
        let package = tree.package_name().to_string();
        let mut siblings = Vec::new();
        for sibling in sibling_files(path)? {
            let text = read_file(&sibling)?;
            match parse_file(&text) {
                Ok(t) if t.package_name() == package => siblings.push((sibling, t)),
                Ok(t) => debug!(file = %sibling.display(), package = t.package_name(), "skipping file of another package"),
                Err(e) => debug!(file = %sibling.display(), error = %e, "skipping unparsable sibling"),
            }
        }
        debug!(count = siblings.len(), "loading package siblings");
        Ok(Analysis::load(path, tree, siblings, ctx))
    }

    /// Both signatures. A function without results is only acceptable
    /// when the failure branch may panic.
    fn signatures(&self, site: &CallSite, options: &ExpandOptions) -> ExpandResult<(EnclosingFunction, Signature)> {
        let tree = self.tree();
        let enclosing = enclosing_function(&self.prog, self.file, tree, &site.path, &options.failure_type)?;
        if enclosing.signature.is_empty() && !options.panic_fallback {
            return Err(SignatureError::NoReturnValues {
                function: enclosing.name,
            }
            .into());
        }
        let callee = callee_signature(&self.prog, self.file, tree, site.call, &options.failure_type)?;
        Ok((enclosing, callee))
    }
}

// ============================================================================
// Main Implementation
// ============================================================================

/// Expand the call at `start..end` of the file at `path`.
pub fn expand_file(
    path: &Path,
    start: usize,
    end: usize,
    ctx: &BuildContext,
    options: &ExpandOptions,
) -> ExpandResult<Expansion> {
    let source = read_file(path)?;
    expand_source(path, &source, start, end, ctx, options)
}

/// Expand the call at `start..end` of `source`, the contents of `path`.
///
/// `path` locates the package: its directory is searched for sibling files
/// and `vendor/` directories.
pub fn expand_source(
    path: &Path,
    source: &str,
    start: usize,
    end: usize,
    ctx: &BuildContext,
    options: &ExpandOptions,
) -> ExpandResult<Expansion> {
    options.validate()?;
    let tree = parse_file(source).map_err(|e| ExpandError::parse(path, source, &e))?;
    let site = locate_call(&tree, start, end)?;

    let mut analysis = Analysis::load(path, tree, Vec::new(), ctx);
    let (enclosing, callee) = match analysis.signatures(&site, options) {
        Err(ExpandError::Signature(SignatureError::UnknownSignature { callee })) => {
            debug!(%callee, "signature unknown in single file, escalating");
            analysis = analysis.escalate(path, ctx)?;
            analysis.signatures(&site, options)?
        }
        other => other?,
    };

    let mut warnings = Vec::new();
    let body = failure_branch(&analysis, path, &enclosing, options, &mut warnings);
    let plan = build_plan(&analysis, path, &site, &callee, body, options, &mut warnings)?;

    let tree = analysis.tree();
    let rendered = plan.render(tree);
    let mut buffer = String::with_capacity(source.len() + rendered.len());
    buffer.push_str(&source[..plan.subject.start]);
    buffer.push_str(&rendered);
    buffer.push_str(&source[plan.subject.end..]);
    let formatted = reformat(&buffer)?;

    let lines = span_to_line_range(source.as_bytes(), &plan.subject);
    let edit = LineEdit::between(source, &formatted, lines);
    for warning in &warnings {
        warn!(code = %warning.code, "{}", warning.message);
    }
    info!(
        file = %path.display(),
        start_line = edit.start_line,
        end_line = edit.end_line,
        "expanded call"
    );
    Ok(Expansion {
        formatted,
        subject: plan.subject,
        edit,
        warnings,
    })
}

// ============================================================================
// Failure branch
// ============================================================================

fn location_of(tree: &SourceTree, path: &Path, node: NodeId) -> Location {
    let (line, col) = byte_offset_to_position(tree.source().as_bytes(), tree.span(node).start);
    Location::new(path.display().to_string(), line, col)
}

/// Statements run when the call failed.
fn failure_branch(
    analysis: &Analysis,
    path: &Path,
    enclosing: &EnclosingFunction,
    options: &ExpandOptions,
    warnings: &mut Vec<Warning>,
) -> Vec<BodyStmt> {
    let tree = analysis.tree();
    let sig = &enclosing.signature;
    let mut body = Vec::new();
    if let Some(stmt) = &options.on_error {
        body.push(BodyStmt::Verbatim(stmt.trim().to_string()));
    }

    let has_failure_slot = sig.failure_slot().is_some();
    if sig.is_empty() || (!has_failure_slot && options.panic_fallback) {
        body.push(BodyStmt::Panic);
        return body;
    }

    let mut values = Vec::with_capacity(sig.len());
    for slot in &sig.slots {
        if slot.failure {
            values.push(options.failure_ident.clone());
            continue;
        }
        let zero = slot
            .ty_node
            .and_then(|ty| zero_value(&analysis.prog, analysis.file, tree, ty));
        match (zero, slot.ty_node) {
            (Some(value), _) => values.push(value),
            (None, ty) => {
                let mut warning = Warning::new(
                    "unresolved_zero_value",
                    format!("no zero value known for result {} of {}", slot.index + 1, enclosing.name),
                )
                .suggest("replace the nil placeholder with the zero value of the result type");
                if let Some(ty) = ty {
                    warning = warning.at(location_of(tree, path, ty));
                }
                warnings.push(warning);
                values.push("nil".to_string());
            }
        }
    }
    if !has_failure_slot && options.on_error.is_none() {
        warnings.push(
            Warning::new(
                "failure_dropped",
                format!("{} has no {} result; the failure is not propagated", enclosing.name, options.failure_type),
            )
            .at(location_of(tree, path, enclosing.node))
            .suggest("pass --panic or --on-error to handle the failure"),
        );
    }
    body.push(BodyStmt::Return(values));
    body
}

// ============================================================================
// Replacement plan
// ============================================================================

fn is_discard(tree: &SourceTree, id: NodeId) -> bool {
    tree.ident_name(id) == Some("_")
}

/// The replacement for the call, by the number of results it has.
fn build_plan(
    analysis: &Analysis,
    path: &Path,
    site: &CallSite,
    callee: &Signature,
    body: Vec<BodyStmt>,
    options: &ExpandOptions,
    warnings: &mut Vec<Warning>,
) -> ExpandResult<ReplacementPlan> {
    let tree = analysis.tree();
    let call_span = tree.span(site.call);
    let mut plan = ReplacementPlan {
        subject: call_span,
        call: site.call,
        failure_ident: options.failure_ident.clone(),
        failure_type: options.failure_type.clone(),
        stmts: Vec::new(),
    };

    match callee.len() {
        0 => {
            info!("callee has no results, leaving the call as is");
            plan.stmts.push(PlanStmt::Call);
        }
        1 => {
            let mut define = true;
            if let Some((assign, lhs, op)) = parent_assignment(tree, site) {
                plan.subject = tree.span(assign);
                let replaces_failure = lhs.len() == 1 && tree.ident_name(lhs[0]) == Some(options.failure_ident.as_str());
                define = !(replaces_failure && op == Op::Assign);
                let named: Vec<&str> = lhs
                    .iter()
                    .filter(|&&id| !is_discard(tree, id) && tree.ident_name(id) != Some(options.failure_ident.as_str()))
                    .map(|&id| tree.text(id))
                    .collect();
                if !named.is_empty() {
                    warnings.push(
                        Warning::new(
                            "assignment_target_replaced",
                            format!("assignment to {} replaced by {}", named.join(", "), options.failure_ident),
                        )
                        .at(location_of(tree, path, assign)),
                    );
                }
            }
            info!(define, "wrapping single-result call in an if statement");
            plan.stmts.push(PlanStmt::Check {
                init: Some((vec![Target::Failure], define)),
                body,
            });
        }
        results => {
            let Some(assign) = enclosing_assignment(tree, site) else {
                return Err(ExpandError::NoAssignmentFound { results });
            };
            let NodeKind::AssignStmt { lhs, op, .. } = tree.kind(assign) else {
                return Err(ExpandError::NoAssignmentFound { results });
            };
            plan.subject = tree.span(assign);

            let only_discard = lhs.iter().all(|&id| is_discard(tree, id));
            let mut targets: Vec<Target> = lhs.iter().map(|&id| Target::Node(id)).collect();
            let present = lhs
                .iter()
                .any(|&id| tree.ident_name(id) == Some(options.failure_ident.as_str()));
            if !present {
                let slot = callee.failure_slot().map_or(results - 1, |s| s.index);
                match lhs.get(slot) {
                    Some(&id) if lhs.len() == results && is_discard(tree, id) && !only_discard => {
                        targets[slot] = Target::Failure;
                    }
                    _ => targets.push(Target::Failure),
                }
            }
            target_warnings(tree, path, assign, &targets, results, options, warnings);

            let declares_failure = if *op == Op::Define && !only_discard {
                !present
            } else {
                !only_discard
                    && !analysis.prog.local_visible(
                        analysis.file,
                        &site.path,
                        &options.failure_ident,
                        plan.subject.start,
                    )
            };
            if declares_failure {
                if let Some(later) = later_declaration(tree, &site.path, assign, &options.failure_ident) {
                    warnings.push(
                        Warning::new(
                            "failure_redeclared",
                            format!("{} is declared again later in the same block", options.failure_ident),
                        )
                        .at(location_of(tree, path, later))
                        .suggest("remove the later declaration"),
                    );
                }
            }

            if *op == Op::Define && !only_discard {
                info!("splitting declaring assignment and check");
                plan.stmts.push(PlanStmt::Assign { targets, define: true });
                plan.stmts.push(PlanStmt::Check { init: None, body });
            } else {
                if declares_failure {
                    info!(ident = %options.failure_ident, "declaring failure identifier");
                    plan.stmts.push(PlanStmt::DeclareFailure);
                }
                info!(define = only_discard, "moving assignment into the if statement");
                plan.stmts.push(PlanStmt::Check {
                    init: Some((targets, only_discard)),
                    body,
                });
            }
        }
    }
    debug!(subject = %plan.subject, stmts = plan.stmts.len(), "replacement plan");
    Ok(plan)
}

/// The innermost statement around the call, if it is an assignment.
///
/// A function literal between the call and that statement ends the search:
/// an assignment outside the literal does not receive the call's results.
fn enclosing_assignment(tree: &SourceTree, site: &CallSite) -> Option<NodeId> {
    let index = site.path.index_of(site.call)?;
    for &id in &site.path.path[index + 1..] {
        let kind = tree.kind(id);
        if kind.is_func() {
            return None;
        }
        if kind.is_stmt() {
            return matches!(kind, NodeKind::AssignStmt { .. }).then_some(id);
        }
    }
    None
}

/// A declaration of `name` after `stmt` in the statement list holding it.
fn later_declaration(tree: &SourceTree, path: &NodePath, stmt: NodeId, name: &str) -> Option<NodeId> {
    let mut inner = stmt;
    let mut index = path.index_of(stmt)?;
    let siblings = loop {
        let parent = *path.path.get(index + 1)?;
        match tree.kind(parent) {
            NodeKind::BlockStmt { stmts } => break stmts,
            NodeKind::CaseClause { body, .. } | NodeKind::CommClause { body, .. } => break body,
            NodeKind::LabeledStmt { .. } => {
                inner = parent;
                index += 1;
            }
            _ => return None,
        }
    };
    let at = siblings.iter().position(|&id| id == inner)?;
    siblings[at + 1..].iter().copied().find(|&id| declares(tree, id, name))
}

/// `var name ...`, or a `:=` with nothing else to declare.
fn declares(tree: &SourceTree, stmt: NodeId, name: &str) -> bool {
    let is_name = |id: NodeId| tree.ident_name(id) == Some(name);
    match tree.kind(stmt) {
        NodeKind::DeclStmt { decl } => match tree.kind(*decl) {
            NodeKind::GenDecl {
                keyword: DeclKeyword::Var,
                specs,
                ..
            } => specs.iter().any(|&spec| match tree.kind(spec) {
                NodeKind::ValueSpec { names, .. } => names.iter().any(|&n| is_name(n)),
                _ => false,
            }),
            _ => false,
        },
        NodeKind::AssignStmt {
            lhs, op: Op::Define, ..
        } => lhs.iter().any(|&id| is_name(id)) && lhs.iter().all(|&id| is_name(id) || is_discard(tree, id)),
        _ => false,
    }
}

/// The assignment whose single right-hand side is the call.
fn parent_assignment<'t>(tree: &'t SourceTree, site: &CallSite) -> Option<(NodeId, &'t [NodeId], Op)> {
    let index = site.path.index_of(site.call)?;
    let mut parent = *site.path.path.get(index + 1)?;
    // `err = (f())`
    while matches!(tree.kind(parent), NodeKind::Paren { .. }) {
        parent = *site.path.path.get(site.path.index_of(parent)? + 1)?;
    }
    match tree.kind(parent) {
        NodeKind::AssignStmt { lhs, op, rhs } if rhs.len() == 1 && tree.unparen(rhs[0]) == site.call => {
            Some((parent, lhs.as_slice(), *op))
        }
        _ => None,
    }
}

fn target_warnings(
    tree: &SourceTree,
    path: &Path,
    assign: NodeId,
    targets: &[Target],
    results: usize,
    options: &ExpandOptions,
    warnings: &mut Vec<Warning>,
) {
    let location = || location_of(tree, path, assign);
    if targets.len() != results {
        warnings.push(
            Warning::new(
                "target_count_mismatch",
                format!("{} assignment targets for {} results", targets.len(), results),
            )
            .at(location()),
        );
    }
    let nodes = || {
        targets.iter().filter_map(|t| match t {
            Target::Node(id) => Some(*id),
            Target::Failure => None,
        })
    };
    let discards = nodes().filter(|&id| is_discard(tree, id)).count();
    let named = nodes()
        .filter(|&id| !is_discard(tree, id) && tree.ident_name(id) != Some(options.failure_ident.as_str()))
        .count();
    if discards > 0 && named > 0 {
        warnings.push(
            Warning::new("mixed_targets", "assignment mixes discarded and named results").at(location()),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "package main\n\nimport (\n\t\"io\"\n\t\"io/ioutil\"\n\t\"os\"\n\t\"strings\"\n)\n\nvar _ = io.EOF\nvar _ = ioutil.Discard\nvar _ = strings.NewReader\n\n";

    /// Expand at the first occurrence of `marker` in a `main.go` made of
    /// the shared imports followed by `body`.
    fn expand_with(body: &str, marker: &str, options: &ExpandOptions) -> ExpandResult<(String, Expansion)> {
        let source = format!("{HEADER}{body}");
        let at = source.find(marker).expect("marker") + 1;
        let expansion = expand_source(
            Path::new("main.go"),
            &source,
            at,
            at,
            &BuildContext::default(),
            options,
        )?;
        let tail = expansion.formatted[HEADER.len()..].to_string();
        Ok((tail, expansion))
    }

    fn expand(body: &str, marker: &str) -> String {
        expand_with(body, marker, &ExpandOptions::default()).unwrap().0
    }

    mod single_result {
        use super::*;

        #[test]
        fn bare_call() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tos.Remove(\"/tmp/foo\")\n\treturn 0, nil\n}\n",
                    "Remove"
                ),
                "func logic() (int, error) {\n\tif err := os.Remove(\"/tmp/foo\"); err != nil {\n\t\treturn 0, err\n\t}\n\treturn 0, nil\n}\n"
            );
        }

        #[test]
        fn inline_comments_survive() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tos.Remove(\"/tmp/foo\" /*path*/) // delete\n\treturn 0, nil\n}\n",
                    "Remove"
                ),
                "func logic() (int, error) {\n\tif err := os.Remove(\"/tmp/foo\" /*path*/); err != nil {\n\t\treturn 0, err\n\t} // delete\n\treturn 0, nil\n}\n"
            );
        }

        #[test]
        fn reassignment_of_failure_keeps_token() {
            assert_eq!(
                expand(
                    "func logic() error {\n\tvar err error\n\terr = os.Remove(\"a\")\n\treturn err\n}\n",
                    "Remove"
                ),
                "func logic() error {\n\tvar err error\n\tif err = os.Remove(\"a\"); err != nil {\n\t\treturn err\n\t}\n\treturn err\n}\n"
            );
        }

        #[test]
        fn named_target_is_replaced_with_warning() {
            let (out, expansion) = expand_with(
                "func logic() error {\n\tfailed := os.Remove(\"a\")\n\treturn nil\n}\n",
                "Remove",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("if err := os.Remove(\"a\"); err != nil {"), "{out}");
            assert_eq!(expansion.warnings[0].code, "assignment_target_replaced");
        }

        #[test]
        fn zero_results_is_left_alone() {
            assert_eq!(
                expand("func logic() error {\n\tos.Clearenv()\n\treturn nil\n}\n", "Clearenv"),
                "func logic() error {\n\tos.Clearenv()\n\treturn nil\n}\n"
            );
        }
    }

    mod multiple_results {
        use super::*;

        #[test]
        fn declaring_assignment_is_split() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tn := io.Copy(ioutil.Discard, strings.NewReader(\"test\"))\n\treturn n, nil\n}\n",
                    "Copy"
                ),
                "func logic() (int, error) {\n\tn, err := io.Copy(ioutil.Discard, strings.NewReader(\"test\"))\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\treturn n, nil\n}\n"
            );
        }

        #[test]
        fn failure_already_a_target() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tn, err := ioutil.ReadAll(nil)\n\treturn len(n), nil\n}\n",
                    "ReadAll"
                ),
                "func logic() (int, error) {\n\tn, err := ioutil.ReadAll(nil)\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\treturn len(n), nil\n}\n"
            );
        }

        #[test]
        fn discard_only_becomes_declaring() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tf, err := os.Create(\"/tmp/a\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\t_ = f.Write([]byte(\"foo\"))\n\treturn 0, nil\n}\n",
                    "Write"
                ),
                "func logic() (int, error) {\n\tf, err := os.Create(\"/tmp/a\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\tif _, err := f.Write([]byte(\"foo\")); err != nil {\n\t\treturn 0, err\n\t}\n\treturn 0, nil\n}\n"
            );
        }

        #[test]
        fn failure_is_declared_when_not_in_scope() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tf, ferr := os.Create(\"/tmp/a\")\n\tif ferr != nil {\n\t\treturn 0, ferr\n\t}\n\tvar n int\n\tn = f.Write([]byte(\"foo\"))\n\treturn n, nil\n}\n",
                    "Write"
                ),
                "func logic() (int, error) {\n\tf, ferr := os.Create(\"/tmp/a\")\n\tif ferr != nil {\n\t\treturn 0, ferr\n\t}\n\tvar n int\n\tvar err error\n\tif n, err = f.Write([]byte(\"foo\")); err != nil {\n\t\treturn 0, err\n\t}\n\treturn n, nil\n}\n"
            );
        }

        #[test]
        fn failure_in_scope_is_reused() {
            assert_eq!(
                expand(
                    "func logic() (int, error) {\n\tf, err := os.Create(\"/tmp/a\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\tvar n int\n\tn = f.Write([]byte(\"foo\"))\n\treturn n, nil\n}\n",
                    "Write"
                ),
                "func logic() (int, error) {\n\tf, err := os.Create(\"/tmp/a\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\tvar n int\n\tif n, err = f.Write([]byte(\"foo\")); err != nil {\n\t\treturn 0, err\n\t}\n\treturn n, nil\n}\n"
            );
        }

        #[test]
        fn trailing_discard_takes_the_failure() {
            let (out, expansion) = expand_with(
                "func logic() (int, error) {\n\tf, _ := os.Create(\"/tmp/a\")\n\t_ = f\n\treturn 0, nil\n}\n",
                "Create",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("\tf, err := os.Create(\"/tmp/a\")\n\tif err != nil {\n"), "{out}");
            assert!(expansion.warnings.is_empty(), "{:?}", expansion.warnings);
        }

        #[test]
        fn outside_assignment_is_rejected() {
            let err = expand_with(
                "func logic() error {\n\tos.Create(\"/tmp/a\")\n\treturn nil\n}\n",
                "Create",
                &ExpandOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, ExpandError::NoAssignmentFound { results: 2 }), "{err}");
        }

        fn warning_codes(expansion: &Expansion) -> Vec<&str> {
            expansion.warnings.iter().map(|w| w.code.as_str()).collect()
        }

        #[test]
        fn later_declaration_in_block_is_warned() {
            let (out, expansion) = expand_with(
                "func logic() (int, error) {\n\tf, ferr := os.Create(\"/tmp/a\")\n\tif ferr != nil {\n\t\treturn 0, ferr\n\t}\n\tvar n int\n\tn = f.Write([]byte(\"foo\"))\n\tvar err error\n\t_ = err\n\treturn n, nil\n}\n",
                "Write",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("\tvar err error\n\tif n, err = f.Write([]byte(\"foo\")); err != nil {\n"), "{out}");
            assert_eq!(warning_codes(&expansion), vec!["failure_redeclared"]);
            let location = expansion.warnings[0].location.as_ref().unwrap();
            assert_eq!(location.line, 21);
        }

        #[test]
        fn later_declaration_after_split_is_warned() {
            let (out, expansion) = expand_with(
                "func logic() (int, error) {\n\tn := io.Copy(ioutil.Discard, strings.NewReader(\"test\"))\n\terr := os.Remove(\"a\")\n\t_ = err\n\treturn n, nil\n}\n",
                "Copy",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("\tn, err := io.Copy("), "{out}");
            assert_eq!(warning_codes(&expansion), vec!["failure_redeclared"]);
        }

        #[test]
        fn declaration_in_nested_block_is_not_warned() {
            let (_, expansion) = expand_with(
                "func logic() (int, error) {\n\tn := io.Copy(ioutil.Discard, strings.NewReader(\"test\"))\n\tif n > 0 {\n\t\tvar err error\n\t\t_ = err\n\t}\n\treturn n, nil\n}\n",
                "Copy",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(expansion.warnings.is_empty(), "{:?}", expansion.warnings);
        }

        #[test]
        fn assignment_outside_function_literal_is_not_used() {
            let err = expand_with(
                "func logic() error {\n\tcb := func() error {\n\t\tos.Create(\"a\")\n\t\treturn nil\n\t}\n\treturn cb()\n}\n",
                "Create",
                &ExpandOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, ExpandError::NoAssignmentFound { results: 2 }), "{err}");
        }
    }

    mod failure_branch {
        use super::*;

        #[test]
        fn on_error_statement_comes_first() {
            let options = ExpandOptions {
                on_error: Some("log.Fatal(err.Error())".to_string()),
                ..ExpandOptions::default()
            };
            let (out, expansion) = expand_with(
                "func logic() (int, string) {\n\tb := ioutil.ReadAll(nil)\n\treturn len(b), \"hoi\"\n}\n",
                "ReadAll",
                &options,
            )
            .unwrap();
            assert_eq!(
                out,
                "func logic() (int, string) {\n\tb, err := ioutil.ReadAll(nil)\n\tif err != nil {\n\t\tlog.Fatal(err.Error())\n\t\treturn 0, \"\"\n\t}\n\treturn len(b), \"hoi\"\n}\n"
            );
            assert!(expansion.warnings.is_empty());
        }

        #[test]
        fn dropped_failure_is_warned() {
            let (out, expansion) = expand_with(
                "func logic() int {\n\tos.Remove(\"a\")\n\treturn 42\n}\n",
                "Remove",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("\t\treturn 0\n"), "{out}");
            assert_eq!(expansion.warnings[0].code, "failure_dropped");
        }

        #[test]
        fn panic_without_failure_result() {
            let options = ExpandOptions {
                panic_fallback: true,
                ..ExpandOptions::default()
            };
            let (out, _) = expand_with(
                "func logic() int {\n\tos.Remove(\"hello\")\n\treturn 0\n}\n\nfunc logicTwo() {\n\tos.Create(\"hello\")\n}\n",
                "Remove",
                &options,
            )
            .unwrap();
            assert!(out.contains("if err := os.Remove(\"hello\"); err != nil {\n\t\tpanic(err)\n\t}"), "{out}");

            let (out, _) = expand_with(
                "func logicTwo() {\n\t_ = os.Create(\"hello\")\n}\n",
                "Create",
                &options,
            )
            .unwrap();
            assert!(out.contains("if _, err := os.Create(\"hello\"); err != nil {\n\t\tpanic(err)\n\t}"), "{out}");
        }

        #[test]
        fn no_results_without_panic_is_rejected() {
            let err = expand_with("func logic() {\n\tos.Remove(\"a\")\n}\n", "Remove", &ExpandOptions::default())
                .unwrap_err();
            assert!(
                matches!(err, ExpandError::Signature(SignatureError::NoReturnValues { ref function }) if function == "logic"),
                "{err}"
            );
        }

        #[test]
        fn unresolved_zero_value_is_a_placeholder() {
            let (out, expansion) = expand_with(
                "func logic() (mystery.Thing, error) {\n\tos.Remove(\"a\")\n\treturn nil, nil\n}\n",
                "Remove",
                &ExpandOptions::default(),
            )
            .unwrap();
            assert!(out.contains("\t\treturn nil, err\n"), "{out}");
            assert_eq!(expansion.warnings[0].code, "unresolved_zero_value");
            assert_eq!(expansion.warnings[0].location.as_ref().map(|l| l.line), Some(14));
        }
    }

    mod escalation {
        use super::*;

        fn package(dir: &Path, files: &[(&str, &str)]) {
            for (name, text) in files {
                fs::write(dir.join(name), text).unwrap();
            }
        }

        #[test]
        fn callee_in_sibling_file() {
            let tmp = TempDir::new().unwrap();
            package(
                tmp.path(),
                &[
                    ("a.go", "package pkg\n\nfunc Logic() error {\n\thelper()\n\treturn nil\n}\n"),
                    ("b.go", "package pkg\n\nfunc helper() error {\n\treturn nil\n}\n"),
                    ("iferr-scratch.go", "package pkg\n\nfunc helper() (int, error)\n"),
                ],
            );
            let path = tmp.path().join("a.go");
            let source = fs::read_to_string(&path).unwrap();
            let at = source.find("helper").unwrap();
            let expansion =
                expand_file(&path, at, at, &BuildContext::default(), &ExpandOptions::default()).unwrap();
            assert!(
                expansion.formatted.contains("if err := helper(); err != nil {\n\t\treturn err\n\t}"),
                "{}",
                expansion.formatted
            );
        }

        #[test]
        fn still_unknown_after_escalation() {
            let tmp = TempDir::new().unwrap();
            package(
                tmp.path(),
                &[("a.go", "package pkg\n\nvar boom func() error\n\nfunc Logic() error {\n\tboom()\n\treturn nil\n}\n")],
            );
            let path = tmp.path().join("a.go");
            let source = fs::read_to_string(&path).unwrap();
            let at = source.find("boom()").unwrap();
            let err = expand_file(&path, at, at, &BuildContext::default(), &ExpandOptions::default()).unwrap_err();
            assert!(matches!(err, ExpandError::Signature(SignatureError::UnknownSignature { .. })), "{err}");
        }
    }

    mod options {
        use super::*;

        #[test]
        fn malformed_on_error_is_rejected() {
            for stmt in ["log.Fatal(", "}\nfunc g() {", "  "] {
                let options = ExpandOptions {
                    on_error: Some(stmt.to_string()),
                    ..ExpandOptions::default()
                };
                assert!(
                    matches!(options.validate(), Err(ExpandError::InvalidOption { .. })),
                    "{stmt:?}"
                );
            }
        }

        #[test]
        fn identifiers_are_checked() {
            let options = ExpandOptions {
                failure_ident: "1err".to_string(),
                ..ExpandOptions::default()
            };
            assert!(options.validate().is_err());
            let options = ExpandOptions {
                failure_ident: "e".to_string(),
                ..ExpandOptions::default()
            };
            assert!(options.validate().is_ok());
        }

        #[test]
        fn custom_failure_identifier() {
            let options = ExpandOptions {
                failure_ident: "e".to_string(),
                ..ExpandOptions::default()
            };
            let (out, _) = expand_with(
                "func logic() error {\n\tos.Remove(\"a\")\n\treturn nil\n}\n",
                "Remove",
                &options,
            )
            .unwrap();
            assert!(out.contains("if e := os.Remove(\"a\"); e != nil {\n\t\treturn e\n\t}"), "{out}");
        }

        #[test]
        fn parse_error_carries_location() {
            let err = expand_source(
                Path::new("bad.go"),
                "package main\n\nfunc f() {\n\tx := )\n}\n",
                30,
                30,
                &BuildContext::default(),
                &ExpandOptions::default(),
            )
            .unwrap_err();
            let ExpandError::Parse { line, snippet, .. } = &err else {
                panic!("expected parse error, got {err}");
            };
            assert_eq!(*line, 4);
            assert!(snippet.contains("bad.go"));
        }
    }
}
