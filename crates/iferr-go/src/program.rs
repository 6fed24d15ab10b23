//! The loaded program: files, packages, objects, types and the facts the
//! checker records about them.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use iferr_go_cst::{NodeId, NodePath, SourceTree};

use crate::scope::{ScopeId, ScopeKind, Scopes};
use crate::types::{
    BasicKind, DeclSite, FileId, FuncSig, InterfaceType, NamedId, NamedType, ObjId, ObjKind,
    Object, PkgId, Selection, SelectionKind, Type,
};

/// Depth limit for walking chains of defined types and embedded fields.
const MAX_DEPTH: usize = 16;

// ============================================================================
// Files and Packages
// ============================================================================

#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub tree: Rc<SourceTree>,
    pub pkg: PkgId,
}

#[derive(Debug)]
pub struct Package {
    /// Import path, or the package name for the package being expanded.
    pub path: String,
    pub name: String,
    pub scope: ScopeId,
    pub files: Vec<FileId>,
}

// ============================================================================
// Info
// ============================================================================

/// Facts recorded while checking, keyed by file and node.
#[derive(Debug, Default)]
pub struct Info {
    /// Identifier → object it denotes.
    pub uses: HashMap<(FileId, NodeId), ObjId>,
    /// Selector expression → what it selects, when `x` is a value.
    pub selections: HashMap<(FileId, NodeId), Selection>,
    /// Node → scope it opens. Function bodies share the function's scope,
    /// recorded under the declaration, its type and its body block.
    pub scopes: HashMap<(FileId, NodeId), ScopeId>,
}

// ============================================================================
// Program
// ============================================================================

#[derive(Debug)]
pub struct Program {
    pub files: Vec<SourceFile>,
    pub packages: Vec<Package>,
    pub objects: Vec<Object>,
    pub named: Vec<NamedType>,
    pub scopes: Scopes,
    pub universe: ScopeId,
    pub info: Info,
    error_type: NamedId,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        let mut scopes = Scopes::default();
        let universe = scopes.create(None, ScopeKind::Universe);
        let mut prog = Program {
            files: Vec::new(),
            packages: Vec::new(),
            objects: Vec::new(),
            named: Vec::new(),
            scopes,
            universe,
            info: Info::default(),
            error_type: NamedId(0),
        };
        prog.declare_universe();
        prog
    }

    fn declare_universe(&mut self) {
        const BASIC: &[&str] = &[
            "bool", "byte", "complex64", "complex128", "float32", "float64", "int", "int8",
            "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
            "uint64", "uintptr",
        ];
        const BUILTINS: &[&str] = &[
            "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len",
            "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
        ];

        for &name in BASIC {
            let ty = BasicKind::lookup(name).map(Type::Basic).unwrap_or(Type::Invalid);
            self.declare_predeclared(name, ObjKind::TypeName, ty);
        }

        let error_method = Rc::new(FuncSig {
            results: vec![Type::Basic(BasicKind::String)],
            ..FuncSig::default()
        });
        let error_iface = Type::Interface(Rc::new(InterfaceType {
            methods: vec![("Error".to_string(), error_method)],
            embeds: Vec::new(),
        }));
        let error_obj = self.declare_predeclared("error", ObjKind::TypeName, Type::Invalid);
        self.error_type = self.new_named(error_obj, error_iface);

        let empty = Type::Interface(Rc::new(InterfaceType::default()));
        self.declare_predeclared("any", ObjKind::TypeName, empty.clone());
        let comparable = self.declare_predeclared("comparable", ObjKind::TypeName, Type::Invalid);
        self.new_named(comparable, empty);

        let bool_ty = Type::Basic(BasicKind::Bool);
        self.declare_predeclared("true", ObjKind::Const, bool_ty.clone());
        self.declare_predeclared("false", ObjKind::Const, bool_ty);
        self.declare_predeclared("iota", ObjKind::Const, Type::Basic(BasicKind::Int));
        self.declare_predeclared("nil", ObjKind::Nil, Type::Basic(BasicKind::UntypedNil));
        for &name in BUILTINS {
            self.declare_predeclared(name, ObjKind::Builtin, Type::Invalid);
        }
    }

    fn declare_predeclared(&mut self, name: &str, kind: ObjKind, ty: Type) -> ObjId {
        let obj = self.new_object(Object {
            name: name.to_string(),
            kind,
            ty,
            decl: None,
            pkg: None,
        });
        self.scopes.insert(self.universe, name, obj, 0);
        obj
    }

    // ---- arenas ----

    pub fn add_package(&mut self, path: &str, name: &str) -> PkgId {
        let scope = self.scopes.create(Some(self.universe), ScopeKind::Package);
        let id = PkgId(self.packages.len() as u32);
        self.packages.push(Package {
            path: path.to_string(),
            name: name.to_string(),
            scope,
            files: Vec::new(),
        });
        id
    }

    pub fn add_file(&mut self, pkg: PkgId, path: PathBuf, tree: SourceTree) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            path,
            tree: Rc::new(tree),
            pkg,
        });
        self.packages[pkg.0 as usize].files.push(id);
        id
    }

    pub fn new_object(&mut self, obj: Object) -> ObjId {
        let id = ObjId(self.objects.len() as u32);
        self.objects.push(obj);
        id
    }

    /// Create a defined type for `obj` and point the object at it.
    pub fn new_named(&mut self, obj: ObjId, underlying: Type) -> NamedId {
        let id = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            obj,
            underlying,
            methods: Vec::new(),
        });
        self.objects[obj.0 as usize].ty = Type::Named(id);
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.0 as usize]
    }

    pub fn object_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objects[id.0 as usize]
    }

    pub fn named(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    pub fn named_mut(&mut self, id: NamedId) -> &mut NamedType {
        &mut self.named[id.0 as usize]
    }

    /// The predeclared `error` type.
    pub fn error_type(&self) -> Type {
        Type::Named(self.error_type)
    }

    // ---- recorded facts ----

    pub fn use_of(&self, file: FileId, ident: NodeId) -> Option<&Object> {
        self.info.uses.get(&(file, ident)).map(|&id| self.object(id))
    }

    pub fn selection(&self, file: FileId, selector: NodeId) -> Option<&Selection> {
        self.info.selections.get(&(file, selector))
    }

    /// Where an object is declared, with the tree holding the declaration.
    pub fn decl_of(&self, obj: &Object) -> Option<(DeclSite, &SourceTree)> {
        let site = obj.decl?;
        let tree: &SourceTree = &self.file(site.file).tree;
        Some((site, tree))
    }

    /// Whether `name` is declared in a function or block scope visible at
    /// `pos`. The innermost node on `path` with a recorded scope is asked;
    /// without one the answer is `false`.
    pub fn local_visible(&self, file: FileId, path: &NodePath, name: &str, pos: usize) -> bool {
        path.path
            .iter()
            .find_map(|&node| self.info.scopes.get(&(file, node)))
            .is_some_and(|&scope| self.scopes.lookup_local_chain(scope, name, pos).is_some())
    }

    // ---- type queries ----

    /// The underlying type: defined types are followed to their definition.
    pub fn underlying(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_DEPTH {
            let Type::Named(id) = current else {
                return current;
            };
            current = self.named(id).underlying.clone();
        }
        Type::Invalid
    }

    /// Look up method `name` in an interface, including embedded interfaces.
    pub fn interface_method(&self, iface: &InterfaceType, name: &str) -> Option<Rc<FuncSig>> {
        self.interface_method_at(iface, name, 0)
    }

    fn interface_method_at(&self, iface: &InterfaceType, name: &str, depth: usize) -> Option<Rc<FuncSig>> {
        if let Some((_, sig)) = iface.methods.iter().find(|(m, _)| m == name) {
            return Some(Rc::clone(sig));
        }
        if depth >= MAX_DEPTH {
            return None;
        }
        iface.embeds.iter().find_map(|embed| match self.underlying(embed) {
            Type::Interface(inner) => self.interface_method_at(&inner, name, depth + 1),
            _ => None,
        })
    }

    /// Resolve the selector `x.name` for a value `x` of type `ty`.
    ///
    /// Searches breadth-first through embedded fields so the shallowest
    /// match wins, as in Go. A pointer receiver is dereferenced once.
    pub fn lookup_field_or_method(&self, ty: &Type, name: &str) -> Option<Selection> {
        let mut level = vec![deref(ty)];
        let mut seen: HashSet<NamedId> = HashSet::new();

        for depth in 0..MAX_DEPTH {
            let promoted = depth > 0;
            let mut next = Vec::new();
            for t in level {
                if let Type::Named(id) = t {
                    if !seen.insert(id) {
                        continue;
                    }
                    let method = self.named(id).methods.iter().copied().find(|&m| self.object(m).name == name);
                    if let Some(method) = method {
                        return Some(Selection {
                            kind: SelectionKind::MethodVal,
                            obj: Some(method),
                            ty: self.object(method).ty.clone(),
                            recv_is_interface: false,
                            promoted,
                        });
                    }
                }
                match self.underlying(&t) {
                    Type::Struct(fields) => {
                        for field in fields.iter() {
                            if field.name == name {
                                return Some(Selection {
                                    kind: SelectionKind::FieldVal,
                                    obj: None,
                                    ty: field.ty.clone(),
                                    recv_is_interface: false,
                                    promoted,
                                });
                            }
                            if field.embedded {
                                next.push(deref(&field.ty));
                            }
                        }
                    }
                    Type::Interface(iface) => {
                        if let Some(sig) = self.interface_method(&iface, name) {
                            return Some(Selection {
                                kind: SelectionKind::MethodVal,
                                obj: None,
                                ty: Type::Func(sig),
                                recv_is_interface: true,
                                promoted,
                            });
                        }
                    }
                    _ => {}
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }
        None
    }
}

fn deref(ty: &Type) -> Type {
    match ty {
        Type::Pointer(elem) => (**elem).clone(),
        other => other.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructField;

    fn type_name(prog: &mut Program, name: &str, underlying: Type) -> NamedId {
        let obj = prog.new_object(Object {
            name: name.to_string(),
            kind: ObjKind::TypeName,
            ty: Type::Invalid,
            decl: None,
            pkg: None,
        });
        prog.new_named(obj, underlying)
    }

    fn method(prog: &mut Program, recv: NamedId, name: &str) -> ObjId {
        let obj = prog.new_object(Object {
            name: name.to_string(),
            kind: ObjKind::Func,
            ty: Type::Func(Rc::new(FuncSig::default())),
            decl: None,
            pkg: None,
        });
        prog.named_mut(recv).methods.push(obj);
        obj
    }

    mod universe {
        use super::*;

        #[test]
        fn predeclared_names_resolve() {
            let prog = Program::new();
            let (_, err) = prog.scopes.lookup_parent(prog.universe, "error", 0).unwrap();
            assert_eq!(prog.object(err).ty, prog.error_type());
            let (_, len) = prog.scopes.lookup_parent(prog.universe, "len", 0).unwrap();
            assert_eq!(prog.object(len).kind, ObjKind::Builtin);
            let (_, byte) = prog.scopes.lookup_parent(prog.universe, "byte", 0).unwrap();
            assert_eq!(prog.object(byte).ty, Type::Basic(BasicKind::Uint8));
        }

        #[test]
        fn error_has_error_method() {
            let prog = Program::new();
            let sel = prog.lookup_field_or_method(&prog.error_type(), "Error").unwrap();
            assert!(sel.recv_is_interface);
            assert_eq!(sel.kind, SelectionKind::MethodVal);
        }
    }

    mod selection {
        use super::*;

        #[test]
        fn method_through_pointer() {
            let mut prog = Program::new();
            let file = type_name(&mut prog, "File", Type::Struct(Rc::from(Vec::new())));
            let write = method(&mut prog, file, "Write");
            let sel = prog
                .lookup_field_or_method(&Type::Named(file).pointer_to(), "Write")
                .unwrap();
            assert_eq!(sel.obj, Some(write));
            assert!(!sel.recv_is_interface);
            assert!(!sel.promoted);
        }

        #[test]
        fn promoted_through_embedded_field() {
            let mut prog = Program::new();
            let inner = type_name(&mut prog, "Inner", Type::Struct(Rc::from(Vec::new())));
            let close = method(&mut prog, inner, "Close");
            let outer = type_name(
                &mut prog,
                "Outer",
                Type::Struct(Rc::from(vec![StructField {
                    name: "Inner".to_string(),
                    ty: Type::Named(inner).pointer_to(),
                    embedded: true,
                }])),
            );
            let sel = prog.lookup_field_or_method(&Type::Named(outer), "Close").unwrap();
            assert_eq!(sel.obj, Some(close));
            assert!(sel.promoted);
        }

        #[test]
        fn fields_and_missing_names() {
            let mut prog = Program::new();
            let point = type_name(
                &mut prog,
                "Point",
                Type::Struct(Rc::from(vec![StructField {
                    name: "X".to_string(),
                    ty: Type::Basic(BasicKind::Int),
                    embedded: false,
                }])),
            );
            let sel = prog.lookup_field_or_method(&Type::Named(point), "X").unwrap();
            assert_eq!(sel.kind, SelectionKind::FieldVal);
            assert!(prog.lookup_field_or_method(&Type::Named(point), "Y").is_none());
        }

        #[test]
        fn self_embedding_terminates() {
            let mut prog = Program::new();
            let obj = prog.new_object(Object {
                name: "Loop".to_string(),
                kind: ObjKind::TypeName,
                ty: Type::Invalid,
                decl: None,
                pkg: None,
            });
            let id = prog.new_named(obj, Type::Invalid);
            prog.named_mut(id).underlying = Type::Struct(Rc::from(vec![StructField {
                name: "Loop".to_string(),
                ty: Type::Named(id).pointer_to(),
                embedded: true,
            }]));
            assert!(prog.lookup_field_or_method(&Type::Named(id), "Missing").is_none());
        }
    }
}
