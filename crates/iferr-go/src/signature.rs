//! Result signatures.
//!
//! Two signatures matter for an expansion: the callee's, whose result count
//! picks the shape of the rewrite, and the enclosing function's, whose
//! result slots are filled with zero values in the failure branch.
//!
//! Callees are only resolved when the target is statically known. A call
//! through an interface, a function-valued variable or a struct field is
//! reported as [`SignatureError::UnknownSignature`] rather than guessed at.

use iferr_go_cst::{NodeId, NodeKind, NodePath, SourceTree};
use thiserror::Error;
use tracing::debug;

use crate::program::Program;
use crate::types::{FileId, ObjKind, Object, SelectionKind, Type};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("{name} is a builtin and has no signature")]
    BuiltinCallRejected { name: String },

    /// Dynamic dispatch, function values, or names the checker could not
    /// resolve. Recoverable once by loading the rest of the package.
    #[error("cannot determine the signature of {callee}")]
    UnknownSignature { callee: String },

    #[error("call is not inside a function")]
    NoEnclosingFunction,

    #[error("{function} has no results to return the failure through")]
    NoReturnValues { function: String },
}

pub type SignatureResult<T> = Result<T, SignatureError>;

// ============================================================================
// Signature
// ============================================================================

/// One result position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSlot {
    pub index: usize,
    /// Declared type node, for signatures read from the file being
    /// expanded.
    pub ty_node: Option<NodeId>,
    pub semantic: Type,
    /// The slot carries the failure value.
    pub failure: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub slots: Vec<ResultSlot>,
}

impl Signature {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn failure_slot(&self) -> Option<&ResultSlot> {
        self.slots.iter().find(|slot| slot.failure)
    }
}

/// Whether `ty` is the defined type named `failure_type`.
pub fn is_failure_type(prog: &Program, ty: &Type, failure_type: &str) -> bool {
    match ty {
        Type::Named(id) => prog.object(prog.named(*id).obj).name == failure_type,
        _ => false,
    }
}

// ============================================================================
// Callee
// ============================================================================

/// Signature of the function called by `call`.
pub fn callee_signature(
    prog: &Program,
    file: FileId,
    tree: &SourceTree,
    call: NodeId,
    failure_type: &str,
) -> SignatureResult<Signature> {
    let NodeKind::Call { fun, .. } = tree.kind(call) else {
        return Err(SignatureError::UnknownSignature {
            callee: tree.text(call).to_string(),
        });
    };
    let fun = tree.unparen(*fun);
    let unknown = || SignatureError::UnknownSignature {
        callee: tree.text(fun).to_string(),
    };

    let callee: &Object = match tree.kind(fun) {
        NodeKind::Ident { name } => match prog.use_of(file, fun) {
            Some(obj) if obj.kind == ObjKind::Builtin => {
                return Err(SignatureError::BuiltinCallRejected { name: name.clone() })
            }
            Some(obj) if obj.kind == ObjKind::Func => obj,
            _ => return Err(unknown()),
        },
        NodeKind::Selector { sel, .. } => match prog.selection(file, fun) {
            // Qualified identifier: `pkg.Func`.
            None => match prog.use_of(file, *sel) {
                Some(obj) if obj.kind == ObjKind::Func => obj,
                _ => return Err(unknown()),
            },
            Some(selection) if selection.kind == SelectionKind::MethodVal && !selection.recv_is_interface => {
                match selection.obj {
                    Some(method) => prog.object(method),
                    None => return Err(unknown()),
                }
            }
            Some(_) => return Err(unknown()),
        },
        _ => return Err(unknown()),
    };

    let Type::Func(sig) = &callee.ty else {
        return Err(unknown());
    };
    debug!(callee = %callee.name, results = sig.results.len(), "resolved callee");
    let slots = sig
        .results
        .iter()
        .enumerate()
        .map(|(index, ty)| ResultSlot {
            index,
            ty_node: None,
            semantic: ty.clone(),
            failure: is_failure_type(prog, ty, failure_type),
        })
        .collect();
    Ok(Signature { slots })
}

// ============================================================================
// Enclosing function
// ============================================================================

/// The function declaration or literal around the cursor.
#[derive(Debug, Clone)]
pub struct EnclosingFunction {
    pub node: NodeId,
    /// Name for diagnostics.
    pub name: String,
    pub signature: Signature,
}

/// Signature of the innermost function on `path`.
///
/// Zero results are returned as an empty signature; whether that is an
/// error depends on the options of the expansion.
pub fn enclosing_function(
    prog: &Program,
    file: FileId,
    tree: &SourceTree,
    path: &NodePath,
    failure_type: &str,
) -> SignatureResult<EnclosingFunction> {
    let Some((_, func)) = path.find(tree, NodeKind::is_func) else {
        return Err(SignatureError::NoEnclosingFunction);
    };
    let (func_type, name) = match tree.kind(func) {
        NodeKind::FuncDecl { ty, name, .. } => (*ty, tree.ident_name(*name).unwrap_or("_").to_string()),
        NodeKind::FuncLit { ty, .. } => (*ty, "function literal".to_string()),
        _ => return Err(SignatureError::NoEnclosingFunction),
    };

    let mut slots = Vec::new();
    if let NodeKind::FuncType {
        results: Some(results), ..
    } = tree.kind(func_type)
    {
        if let NodeKind::FieldList { fields, .. } = tree.kind(*results) {
            for &field in fields {
                let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
                    continue;
                };
                let semantic = declared_type(prog, file, tree, *ty);
                let failure = tree.ident_name(*ty) == Some(failure_type)
                    || is_failure_type(prog, &semantic, failure_type);
                for _ in 0..names.len().max(1) {
                    slots.push(ResultSlot {
                        index: slots.len(),
                        ty_node: Some(*ty),
                        semantic: semantic.clone(),
                        failure,
                    });
                }
            }
        }
    }

    Ok(EnclosingFunction {
        node: func,
        name,
        signature: Signature { slots },
    })
}

/// Type denoted by a type expression, from the uses the checker recorded.
pub fn declared_type(prog: &Program, file: FileId, tree: &SourceTree, ty: NodeId) -> Type {
    let type_name = |ident: NodeId| match prog.use_of(file, ident) {
        Some(obj) if obj.kind == ObjKind::TypeName => obj.ty.clone(),
        _ => Type::Invalid,
    };
    match tree.kind(ty) {
        NodeKind::Ident { .. } => type_name(ty),
        NodeKind::Selector { sel, .. } => type_name(*sel),
        NodeKind::Index { x, .. } => declared_type(prog, file, tree, *x),
        NodeKind::Paren { x } => declared_type(prog, file, tree, *x),
        NodeKind::Star { x } => declared_type(prog, file, tree, *x).pointer_to(),
        _ => Type::Invalid,
    }
}

// ============================================================================
// Tests
// ============================================================================
