//! Source transformations.
//!
//! Each operation takes a file and a position and produces the rewritten
//! file; nothing is written here.

pub mod expand_err;
pub mod plan;

pub use expand_err::{expand_file, expand_source, ExpandError, ExpandOptions, ExpandResult, Expansion};
