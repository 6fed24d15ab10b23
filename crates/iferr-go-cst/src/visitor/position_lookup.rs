// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Position-to-node-path lookup.
//!
//! The tree has no parent pointers. Questions about what encloses a position
//! are answered from a [`NodePath`]: the chain of nodes from the smallest
//! node containing a byte interval out to the file root, computed once per
//! request by descending from the root.
//!
//! ```text
//! func f() error {            FuncDecl
//!     return g(x)             └ BlockStmt
//!              ^                └ ReturnStmt
//!                                 └ Call
//!                                   └ Ident "x"   <- path[0]
//! ```

use crate::nodes::{NodeId, NodeKind, SourceTree};

/// Nodes enclosing an interval, innermost first, ending at the file root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    pub path: Vec<NodeId>,
    /// The innermost node's span is exactly the interval.
    pub exact: bool,
}

impl NodePath {
    pub fn innermost(&self) -> NodeId {
        self.path[0]
    }

    /// First node, innermost outward, whose kind matches `pred`, with its
    /// index in the path.
    pub fn find(&self, tree: &SourceTree, pred: impl Fn(&NodeKind) -> bool) -> Option<(usize, NodeId)> {
        self.path
            .iter()
            .enumerate()
            .find(|(_, &id)| pred(tree.kind(id)))
            .map(|(i, &id)| (i, id))
    }

    /// Position of `id` in the path.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.path.iter().position(|&n| n == id)
    }
}

/// Smallest node whose span contains `[start, end]`, and the path to it.
///
/// An interval that touches a node's end is still contained in it, so a
/// cursor placed right after `f(x)` lands in the call. When two adjacent
/// siblings both qualify, the earlier one wins. Returns `None` if the
/// interval lies outside the file's declarations.
pub fn path_enclosing_interval(tree: &SourceTree, start: usize, end: usize) -> Option<NodePath> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    if end > tree.source().len() {
        return None;
    }
    let root = tree.root();
    let contains = |id: NodeId| {
        let span = tree.span(id);
        span.start <= start && end <= span.end
    };
    if !contains(root) {
        return None;
    }

    let mut path = vec![root];
    let mut node = root;
    while let Some(child) = tree.children(node).into_iter().find(|&c| contains(c)) {
        path.push(child);
        node = child;
    }

    let span = tree.span(node);
    let exact = span.start == start && span.end == end;
    path.reverse();
    Some(NodePath { path, exact })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    const SRC: &str = "package p\n\nfunc f() (int, error) {\n\tn, err := io.Copy(dst, src)\n\treturn n, err\n}\n";

    fn kinds(tree: &SourceTree, path: &NodePath) -> Vec<&'static str> {
        path.path.iter().map(|&id| tree.kind(id).description()).collect()
    }

    #[test]
    fn cursor_inside_call_argument() {
        let tree = parse_file(SRC).unwrap();
        let at = SRC.find("dst").unwrap() + 1;
        let found = path_enclosing_interval(&tree, at, at).unwrap();
        assert_eq!(
            kinds(&tree, &found),
            vec![
                "identifier",
                "function call",
                "assignment",
                "block",
                "function declaration",
                "source file"
            ]
        );
        assert!(!found.exact);
    }

    #[test]
    fn cursor_just_after_call_lands_in_call() {
        let tree = parse_file(SRC).unwrap();
        let at = SRC.find("src)").unwrap() + 4;
        let found = path_enclosing_interval(&tree, at, at).unwrap();
        assert_eq!(tree.kind(found.innermost()).description(), "function call");
    }

    #[test]
    fn exact_interval() {
        let tree = parse_file(SRC).unwrap();
        let start = SRC.find("io.Copy").unwrap();
        let end = SRC.find("src)").unwrap() + 4;
        let found = path_enclosing_interval(&tree, start, end).unwrap();
        assert!(found.exact);
        assert_eq!(tree.text(found.innermost()), "io.Copy(dst, src)");
    }

    #[test]
    fn interval_spanning_siblings_stops_at_parent() {
        let tree = parse_file(SRC).unwrap();
        let start = SRC.find("dst").unwrap();
        let end = SRC.find("src").unwrap() + 1;
        let found = path_enclosing_interval(&tree, start, end).unwrap();
        assert_eq!(tree.kind(found.innermost()).description(), "function call");
        assert!(!found.exact);
    }

    #[test]
    fn outside_declarations() {
        let tree = parse_file(SRC).unwrap();
        assert!(path_enclosing_interval(&tree, SRC.len(), SRC.len()).is_none());
        assert!(path_enclosing_interval(&tree, SRC.len() + 5, SRC.len() + 5).is_none());
    }

    #[test]
    fn find_enclosing_function() {
        let tree = parse_file(SRC).unwrap();
        let at = SRC.find("return").unwrap();
        let found = path_enclosing_interval(&tree, at, at).unwrap();
        let (index, func) = found.find(&tree, NodeKind::is_func).unwrap();
        assert_eq!(found.index_of(func), Some(index));
        assert!(matches!(tree.kind(func), NodeKind::FuncDecl { .. }));
    }
}
