// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal helpers over the arena tree.
//!
//! Plain pre-order traversal lives on [`crate::SourceTree`] itself
//! (`children`, `walk`, `find_first`). This module holds the lookups built on
//! top of it.

pub mod position_lookup;

pub use position_lookup::{path_enclosing_interval, NodePath};
