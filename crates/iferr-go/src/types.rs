//! Semantic types and objects.
//!
//! Types are plain values. Defined (named) types live in an arena and are
//! referred to by [`NamedId`], which is what lets a type mention itself
//! (`type List struct { next *List }`) without reference cycles.

use std::rc::Rc;

use iferr_go_cst::NodeId;

// ============================================================================
// Identifiers
// ============================================================================

/// Index of a loaded file in a [`crate::program::Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Index of a loaded package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PkgId(pub u32);

/// Index of an object (anything an identifier can denote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub u32);

/// Index of a defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(pub u32);

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    /// Type of the predeclared `nil`.
    UntypedNil,
}

impl BasicKind {
    /// Predeclared type name, including the `byte` and `rune` aliases.
    pub fn lookup(name: &str) -> Option<BasicKind> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            "string" => BasicKind::String,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Unknown or erroneous; every operation on it yields `Invalid` again.
    Invalid,
    Basic(BasicKind),
    Named(NamedId),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(Box<Type>),
    Func(Rc<FuncSig>),
    Struct(Rc<[StructField]>),
    Interface(Rc<InterfaceType>),
    /// Results of a call returning other than exactly one value.
    Tuple(Rc<[Type]>),
    TypeParam,
}

impl Type {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn pointer_to(self) -> Type {
        Type::Pointer(Box::new(self))
    }

    /// Result type of a call with this signature.
    pub fn call_result(sig: &FuncSig) -> Type {
        match sig.results.as_slice() {
            [single] => single.clone(),
            results => Type::Tuple(results.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuncSig {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceType {
    pub methods: Vec<(String, Rc<FuncSig>)>,
    /// Embedded interfaces, resolved when methods are looked up.
    pub embeds: Vec<Type>,
}

/// A defined type: its name, underlying type and declared methods.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub obj: ObjId,
    pub underlying: Type,
    pub methods: Vec<ObjId>,
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Var,
    Const,
    TypeName,
    /// Function or method. Methods are not entered in any scope; they hang
    /// off their receiver's [`NamedType`].
    Func,
    PkgName(PkgId),
    Builtin,
    Nil,
}

/// Where an object was declared.
///
/// For functions and methods `node` is the `FuncDecl`; for everything else it
/// is the declaring identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSite {
    pub file: FileId,
    pub node: NodeId,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub ty: Type,
    pub decl: Option<DeclSite>,
    /// Declaring package; `None` for predeclared objects.
    pub pkg: Option<PkgId>,
}

impl Object {
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

// ============================================================================
// Selections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    FieldVal,
    MethodVal,
}

/// What `x.f` selects when `x` is a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// The method, for methods declared on a defined type.
    pub obj: Option<ObjId>,
    /// Field type, or method signature.
    pub ty: Type,
    /// The method belongs to an interface, so the call is dynamically
    /// dispatched.
    pub recv_is_interface: bool,
    /// Reached through embedded fields.
    pub promoted: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_lookup_handles_aliases() {
        assert_eq!(BasicKind::lookup("byte"), Some(BasicKind::Uint8));
        assert_eq!(BasicKind::lookup("rune"), Some(BasicKind::Int32));
        assert_eq!(BasicKind::lookup("error"), None);
        assert!(BasicKind::Uintptr.is_integer());
        assert!(BasicKind::Float32.is_float());
        assert!(!BasicKind::Complex64.is_float());
    }

    #[test]
    fn call_result_unwraps_single_result() {
        let one = FuncSig {
            results: vec![Type::Basic(BasicKind::Int)],
            ..FuncSig::default()
        };
        assert_eq!(Type::call_result(&one), Type::Basic(BasicKind::Int));

        let none = FuncSig::default();
        assert!(matches!(Type::call_result(&none), Type::Tuple(ref t) if t.is_empty()));
    }

    #[test]
    fn exported_names() {
        let obj = Object {
            name: "Open".to_string(),
            kind: ObjKind::Func,
            ty: Type::Invalid,
            decl: None,
            pkg: None,
        };
        assert!(obj.is_exported());
    }
}
