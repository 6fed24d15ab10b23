//! Go semantic analysis and the if-err expansion for iferr.
//!
//! This crate sits between the syntax layer (`iferr-go-cst`) and the
//! command line:
//!
//! - [`checker`], [`importer`], [`program`], [`scope`], [`types`]: a
//!   best-effort type checker that records identifier uses, member
//!   selections and scopes, loading imports from search roots, `vendor/`
//!   directories or embedded standard-library stubs
//! - [`lookup`]: the call under a cursor position
//! - [`signature`] and [`zero`]: result signatures and zero values
//! - [`ops`]: the expansion itself
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use iferr_go::{expand_source, BuildContext, ExpandOptions};
//!
//! let source = "package main\n\nimport \"os\"\n\nfunc f() error {\n\tos.Remove(\"a\")\n\treturn nil\n}\n";
//! let at = source.find("Remove").unwrap();
//! let expansion = expand_source(
//!     Path::new("main.go"),
//!     source,
//!     at,
//!     at,
//!     &BuildContext::default(),
//!     &ExpandOptions::default(),
//! )
//! .unwrap();
//! assert!(expansion.formatted.contains("if err := os.Remove(\"a\"); err != nil {"));
//! ```

pub mod checker;
pub mod files;
pub mod importer;
pub mod lookup;
pub mod ops;
pub mod program;
pub mod scope;
pub mod signature;
pub mod types;
pub mod zero;

// Bridges into the unified IferrError
mod error_bridges;

pub use importer::BuildContext;
pub use ops::{expand_file, expand_source, ExpandError, ExpandOptions, ExpandResult, Expansion};
