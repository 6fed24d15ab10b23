// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Go parser.
//!
//! [`parse_file`] tokenizes the source, runs the PEG grammar over the token
//! slice and returns the arena tree. Grammar actions build the nodes.
//!
//! Enable the `trace` feature to have the grammar print every rule it tries.

mod builder;
pub mod errors;
mod grammar;

use crate::nodes::SourceTree;
use crate::tokenizer::{tokenize, Tokenized};

use builder::Builder;
pub use errors::{ParserError, Result};

/// Parse a complete Go source file.
pub fn parse_file(source: &str) -> Result<SourceTree> {
    let Tokenized { tokens, comments } = tokenize(source)?;
    let builder = Builder::new(source, &tokens);
    let root = grammar::go::file(&tokens, &builder).map_err(|err| builder.syntax_error(&err))?;
    let nodes = builder.into_nodes()?;
    Ok(SourceTree::new(source.to_string(), nodes, root, comments))
}

// ============================================================================
// Tests
// ============================================================================
