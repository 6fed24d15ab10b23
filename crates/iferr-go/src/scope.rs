//! Lexical scopes.
//!
//! Scopes form a tree: universe, package, file, then function and block
//! scopes nested inside. Local entries remember the offset from which they
//! are visible, so a lookup made after checking finishes still answers
//! "was this name declared before position P?".

use crate::types::ObjId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Func,
    Block,
}

impl ScopeKind {
    /// Function and block scopes, whose entries are ordered by position.
    pub fn is_local(self) -> bool {
        matches!(self, ScopeKind::Func | ScopeKind::Block)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    obj: ObjId,
    visible_from: usize,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    entries: Vec<Entry>,
}

/// Arena of every scope created for a program.
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn create(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            kind,
            entries: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Enter `name` into `scope`, visible from byte offset `visible_from` on.
    pub fn insert(&mut self, scope: ScopeId, name: &str, obj: ObjId, visible_from: usize) {
        if name == "_" {
            return;
        }
        self.scopes[scope.0 as usize].entries.push(Entry {
            name: name.to_string(),
            obj,
            visible_from,
        });
    }

    /// Object named `name` declared directly in `scope`, at any position.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<ObjId> {
        self.get(scope)
            .entries
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| e.obj)
    }

    /// Names declared directly in `scope`, in declaration order.
    pub fn names(&self, scope: ScopeId) -> impl Iterator<Item = (&str, ObjId)> + '_ {
        self.get(scope).entries.iter().map(|e| (e.name.as_str(), e.obj))
    }

    fn lookup_at(&self, scope: ScopeId, name: &str, pos: usize) -> Option<ObjId> {
        let s = self.get(scope);
        let positional = s.kind.is_local();
        s.entries
            .iter()
            .rev()
            .find(|e| e.name == name && (!positional || e.visible_from <= pos))
            .map(|e| e.obj)
    }

    /// Resolve `name` as seen at `pos` from `scope`, walking outward.
    pub fn lookup_parent(&self, scope: ScopeId, name: &str, pos: usize) -> Option<(ScopeId, ObjId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(obj) = self.lookup_at(id, name, pos) {
                return Some((id, obj));
            }
            current = self.get(id).parent;
        }
        None
    }

    /// Like [`Scopes::lookup_parent`], but only through function and block
    /// scopes: package-level and predeclared names are not found.
    pub fn lookup_local_chain(&self, scope: ScopeId, name: &str, pos: usize) -> Option<ObjId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if !self.get(id).kind.is_local() {
                return None;
            }
            if let Some(obj) = self.lookup_at(id, name, pos) {
                return Some(obj);
            }
            current = self.get(id).parent;
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
