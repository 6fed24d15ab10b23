//! Error types and error code constants for iferr.
//!
//! This module provides a unified error type (`IferrError`) that bridges
//! domain-specific errors from different subsystems (parsing, expansion,
//! file discovery) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (no applicable call at the position, unknown
//!   signature, file not found, malformed input source)
//! - `4`: Apply errors (failed to write the result)
//! - `5`: Formatting failed (rendered or spliced code did not re-format)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `IferrError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for IferrError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

use crate::output::Location;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (no call here, unknown signature, file not found).
    ResolutionError = 3,
    /// Apply errors (failed to write changes).
    ApplyError = 4,
    /// Formatting of the expanded source failed.
    FormatFailed = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// Each variant includes enough context to produce a helpful error message
/// and an optional `details` field.
#[derive(Debug, Error)]
pub enum IferrError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The input source could not be parsed.
    #[error("parse error at {file}:{line}:{col}: {message}")]
    ParseFailed {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// The requested expansion does not apply at the given position.
    ///
    /// `reason` is a stable snake_case identifier (e.g. `no_call_expression`).
    #[error("{message}")]
    NotApplicable {
        reason: &'static str,
        message: String,
        location: Option<Location>,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to write the result.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Rendering or re-formatting failed; `buffer` is the intermediate text.
    #[error("format failed: {message}")]
    FormatFailed { message: String, buffer: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&IferrError> for OutputErrorCode {
    fn from(err: &IferrError) -> Self {
        match err {
            IferrError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            IferrError::ParseFailed { .. } => OutputErrorCode::ResolutionError,
            IferrError::NotApplicable { .. } => OutputErrorCode::ResolutionError,
            IferrError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            IferrError::ApplyError { .. } => OutputErrorCode::ApplyError,
            IferrError::FormatFailed { .. } => OutputErrorCode::FormatFailed,
            IferrError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<IferrError> for OutputErrorCode {
    fn from(err: IferrError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl IferrError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        IferrError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        IferrError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a not-applicable error without location.
    pub fn not_applicable(reason: &'static str, message: impl Into<String>) -> Self {
        IferrError::NotApplicable {
            reason,
            message: message.into(),
            location: None,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        IferrError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        IferrError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
