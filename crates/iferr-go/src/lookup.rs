//! Cursor lookup.
//!
//! Maps a byte interval to the node path around it and picks the call
//! expression the user means.

use iferr_go_cst::{path_enclosing_interval, NodeId, NodeKind, NodePath, SourceTree};
use thiserror::Error;
use tracing::debug;

use crate::files::FileError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum LookupError {
    /// The interval lies outside the file.
    #[error("no syntax node at byte offset {offset} (file is {len} bytes)")]
    PositionNotFound { offset: usize, len: usize },

    /// A selection that is not exactly one node.
    #[error("selection {start}..{end} does not match a single node (inside a {within})")]
    AmbiguousSelection {
        start: usize,
        end: usize,
        within: &'static str,
    },

    /// Nothing callable under the cursor.
    #[error("no call expression at byte offset {offset}")]
    NoCallExpression { offset: usize },

    #[error("file error: {0}")]
    File(#[from] FileError),
}

pub type LookupResult<T> = Result<T, LookupError>;

// ============================================================================
// Call site
// ============================================================================

/// The call under the cursor, with the path from it out to the file.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub call: NodeId,
    /// Path from the cursor outward. The call is on it, unless the cursor
    /// sat between statements and the call was picked from the block.
    pub path: NodePath,
}

/// Node path for the interval `start..end`.
///
/// An empty interval that touches no call is moved back over trailing
/// whitespace and one closing parenthesis, which is where editors leave
/// the cursor after typing a call. A non-empty interval must select a
/// node exactly, surrounding whitespace aside.
pub fn resolve_position(tree: &SourceTree, start: usize, end: usize) -> LookupResult<NodePath> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let source = tree.source().as_bytes();
    let not_found = || LookupError::PositionNotFound {
        offset: start,
        len: source.len(),
    };

    if start != end {
        let (lo, hi) = trim_whitespace(source, start, end);
        let path = path_enclosing_interval(tree, lo, hi).ok_or_else(not_found)?;
        if !path.exact {
            return Err(LookupError::AmbiguousSelection {
                start,
                end,
                within: tree.kind(path.innermost()).description(),
            });
        }
        return Ok(path);
    }

    let path = path_enclosing_interval(tree, start, end).ok_or_else(not_found)?;
    if has_call(tree, &path) {
        return Ok(path);
    }
    let moved = step_back(source, start);
    if moved != start {
        if let Some(repaired) = path_enclosing_interval(tree, moved, moved) {
            if has_call(tree, &repaired) {
                debug!(from = start, to = moved, "moved cursor back into call");
                return Ok(repaired);
            }
        }
    }
    Ok(path)
}

/// Pick the call meant by `path`.
///
/// Inside a statement this is the outermost call between the cursor and
/// that statement, so `f(g(x))` with the cursor on `g` still means `f`.
/// On a block (cursor between statements) it is the first call in it.
pub fn call_at(tree: &SourceTree, path: NodePath) -> LookupResult<CallSite> {
    let cursor = tree.span(path.innermost()).start;
    let is_call = |id: &NodeId| matches!(tree.kind(*id), NodeKind::Call { .. });

    let first = path.innermost();
    let call = if matches!(tree.kind(first), NodeKind::BlockStmt { .. }) {
        tree.find_first(first, |kind| matches!(kind, NodeKind::Call { .. }))
    } else {
        let stmt = path
            .path
            .iter()
            .position(|&id| tree.kind(id).is_stmt())
            .unwrap_or(path.path.len());
        path.path[..stmt].iter().rev().copied().find(is_call)
    };

    match call {
        Some(call) => {
            debug!(call = %tree.text(call), "call site");
            Ok(CallSite { call, path })
        }
        None => Err(LookupError::NoCallExpression { offset: cursor }),
    }
}

/// Resolve `start..end` to a call site.
pub fn locate_call(tree: &SourceTree, start: usize, end: usize) -> LookupResult<CallSite> {
    let path = resolve_position(tree, start, end)?;
    call_at(tree, path)
}

fn has_call(tree: &SourceTree, path: &NodePath) -> bool {
    path.find(tree, |kind| matches!(kind, NodeKind::Call { .. })).is_some()
}

fn trim_whitespace(source: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    end = end.min(source.len());
    while start < end && source[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && source[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

/// Offset after skipping back over whitespace and a single `)`.
fn step_back(source: &[u8], offset: usize) -> usize {
    let mut pos = offset.min(source.len());
    while pos > 0 && source[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    if pos > 0 && source[pos - 1] == b')' {
        pos -= 1;
    }
    pos
}

// ============================================================================
// Tests
// ============================================================================
