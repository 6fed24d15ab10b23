//! Core infrastructure for iferr.
//!
//! This crate provides language-agnostic infrastructure:
//! - Byte spans, content hashes and line-based edits
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Text utilities for offset and line:column conversion

pub mod error;
pub mod output;
pub mod patch;
pub mod text;
