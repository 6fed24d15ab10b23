//! Zero values for result slots.
//!
//! The declared type is looked at syntactically first; only names the table
//! does not cover (defined types, qualified types, type parameters) go
//! through the checker's recorded uses.

use iferr_go_cst::{ArrayLen, NodeId, NodeKind, SourceTree};

use crate::program::Program;
use crate::signature::declared_type;
use crate::types::{BasicKind, FileId, ObjKind, Type};

/// Zero value of the type expression `ty`, or `None` when it cannot be
/// determined.
pub fn zero_value(prog: &Program, file: FileId, tree: &SourceTree, ty: NodeId) -> Option<String> {
    let text = || tree.text(ty).to_string();
    match tree.kind(ty) {
        NodeKind::Ident { name } => {
            if let Some(lit) = BasicKind::lookup(name).and_then(basic_zero) {
                // A local type named `int` would shadow the predeclared one.
                if !shadowed(prog, file, ty) {
                    return Some(lit.to_string());
                }
            }
            match name.as_str() {
                "error" | "any" if !shadowed(prog, file, ty) => Some("nil".to_string()),
                _ => semantic_zero(prog, file, tree, ty),
            }
        }
        NodeKind::Paren { x } => zero_value(prog, file, tree, *x),
        NodeKind::ArrayType { len: ArrayLen::Slice, .. } => Some("nil".to_string()),
        NodeKind::ArrayType { .. } | NodeKind::StructType { .. } => Some(format!("{}{{}}", text())),
        NodeKind::Star { .. }
        | NodeKind::MapType { .. }
        | NodeKind::ChanType { .. }
        | NodeKind::FuncType { .. }
        | NodeKind::InterfaceType { .. } => Some("nil".to_string()),
        NodeKind::Selector { .. } | NodeKind::Index { .. } => semantic_zero(prog, file, tree, ty),
        _ => None,
    }
}

fn basic_zero(kind: BasicKind) -> Option<&'static str> {
    match kind {
        BasicKind::Bool => Some("false"),
        BasicKind::String => Some("\"\""),
        k if k.is_integer() || k.is_complex() => Some("0"),
        k if k.is_float() => Some("0.0"),
        BasicKind::UnsafePointer | BasicKind::UntypedNil => Some("nil"),
        _ => None,
    }
}

/// The identifier resolves to something other than a predeclared name.
fn shadowed(prog: &Program, file: FileId, ident: NodeId) -> bool {
    prog.use_of(file, ident).is_some_and(|obj| obj.pkg.is_some())
}

fn semantic_zero(prog: &Program, file: FileId, tree: &SourceTree, ty: NodeId) -> Option<String> {
    if is_type_param(prog, file, tree, ty) {
        return Some(format!("*new({})", tree.text(ty)));
    }
    let declared = declared_type(prog, file, tree, ty);
    if declared.is_invalid() {
        return None;
    }
    match prog.underlying(&declared) {
        Type::Basic(kind) => basic_zero(kind).map(str::to_string),
        Type::Struct(_) | Type::Array(_) => Some(format!("{}{{}}", tree.text(ty))),
        Type::Pointer(_)
        | Type::Slice(_)
        | Type::Map(..)
        | Type::Chan(_)
        | Type::Func(_)
        | Type::Interface(_) => Some("nil".to_string()),
        Type::TypeParam => Some(format!("*new({})", tree.text(ty))),
        Type::Invalid | Type::Named(_) | Type::Tuple(_) => None,
    }
}

fn is_type_param(prog: &Program, file: FileId, tree: &SourceTree, ty: NodeId) -> bool {
    matches!(tree.kind(ty), NodeKind::Ident { .. })
        && prog
            .use_of(file, ty)
            .is_some_and(|obj| obj.kind == ObjKind::TypeName && obj.ty == Type::TypeParam)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{check_package, CheckMode};
    use crate::importer::{BuildContext, Importer};
    use iferr_go_cst::parse_file;
    use std::path::PathBuf;

    /// Zero values of the results of `f`, declared as `func f() (<results>)`.
    fn zeros(decls: &str, results: &str) -> Vec<Option<String>> {
        zeros_of_last(&format!(
            "package main\n\nimport (\n\t\"os\"\n\t\"time\"\n)\n\n{decls}\n\nfunc f() ({results}) {{\n\tpanic(0)\n}}\n"
        ))
    }

    /// Zero values of the results of the last declaration in `source`.
    fn zeros_of_last(source: &str) -> Vec<Option<String>> {
        let ctx = BuildContext::default();
        let mut importer = Importer::new(&ctx);
        let mut prog = Program::new();
        let pkg = prog.add_package("main", "main");
        let file = prog.add_file(pkg, PathBuf::from("main.go"), parse_file(source).unwrap());
        check_package(&mut prog, &mut importer, pkg, CheckMode::Full);

        let tree = std::rc::Rc::clone(&prog.file(file).tree);
        let func = *tree.decls().last().unwrap();
        let NodeKind::FuncDecl { ty, .. } = tree.kind(func) else {
            panic!("not a function");
        };
        let NodeKind::FuncType {
            results: Some(results), ..
        } = tree.kind(*ty)
        else {
            panic!("no results");
        };
        let NodeKind::FieldList { fields, .. } = tree.kind(*results) else {
            panic!("no field list");
        };
        fields
            .iter()
            .map(|&field| match tree.kind(field) {
                NodeKind::Field { ty, .. } => zero_value(&prog, file, &tree, *ty),
                _ => None,
            })
            .collect()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    mod syntactic {
        use super::*;

        #[test]
        fn primitives() {
            assert_eq!(
                zeros("", "int, uint8, rune, float64, complex128, bool, string, error"),
                some(&["0", "0", "0", "0.0", "0", "false", "\"\"", "nil"])
            );
        }

        #[test]
        fn composite_shapes() {
            assert_eq!(
                zeros("", "[]byte, [4]int, *int, map[string]int, chan int, func(), interface{}, struct{ a int }"),
                some(&["nil", "[4]int{}", "nil", "nil", "nil", "nil", "nil", "struct{ a int }{}"])
            );
        }
    }

    mod semantic {
        use super::*;

        #[test]
        fn defined_types_follow_their_underlying_type() {
            assert_eq!(
                zeros(
                    "type point struct{ x, y int }\ntype celsius float64\ntype names []string\ntype shape interface{ Area() float64 }",
                    "point, celsius, names, shape, *point"
                ),
                some(&["point{}", "0.0", "nil", "nil", "nil"])
            );
        }

        #[test]
        fn qualified_types() {
            assert_eq!(zeros("", "time.Duration, time.Time, *os.File, os.FileMode"), some(&["0", "time.Time{}", "nil", "0"]));
        }

        #[test]
        fn shadowed_predeclared_name() {
            assert_eq!(zeros("type int struct{}", "int"), some(&["int{}"]));
        }

        #[test]
        fn type_parameter() {
            assert_eq!(
                zeros_of_last("package main\n\nfunc f[T any]() (T, error) {\n\tpanic(0)\n}\n"),
                some(&["*new(T)", "nil"])
            );
        }

        #[test]
        fn unknown_type_is_unresolved() {
            assert_eq!(zeros("", "mystery.Thing, Unknown"), vec![None, None]);
        }
    }
}
