//! JSON output types and serialization for CLI responses.
//!
//! These types form the **agent contract** of the `--format json` mode.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Nullable vs absent:** absent field means "not applicable"
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{IferrError, OutputErrorCode};
use crate::patch::{ContentHash, LineEdit};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as given on the command line.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }
}

/// Warning information for JSON output.
///
/// - `code`: Stable warning code (required)
/// - `message`: Human-readable message (required)
/// - `location`: Where the warning applies (optional)
/// - `suggestion`: Suggested action (optional)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Suggested action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Warning {
    /// Create a simple warning without location.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a suggested action.
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from an IferrError.
    pub fn from_error(err: &IferrError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            IferrError::InvalidArguments { details, .. } => (details.clone(), None),
            IferrError::ParseFailed {
                file, line, col, ..
            } => (None, Some(Location::new(file.clone(), *line, *col))),
            IferrError::NotApplicable {
                reason, location, ..
            } => (
                Some(serde_json::json!({ "reason": reason })),
                location.clone(),
            ),
            IferrError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            IferrError::ApplyError { file, .. } => {
                let details = file.as_ref().map(|f| serde_json::json!({ "file": f }));
                (details, None)
            }
            IferrError::FormatFailed { buffer, .. } => {
                (Some(serde_json::json!({ "buffer": buffer })), None)
            }
            IferrError::InternalError { .. } => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Response emitted when a request fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The error.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(error: ErrorInfo) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error,
        }
    }

    pub fn from_error(err: &IferrError) -> Self {
        ErrorResponse::new(ErrorInfo::from_error(err))
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for a successful expansion in structured-edit mode.
///
/// `start_line..=end_line` (1-indexed) of the original file are replaced by
/// `replacement_lines`. `content_hash` is the SHA-256 of the original file so
/// a client can refuse to apply the edit to a buffer that has changed since.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The edited file.
    pub file: String,
    /// First replaced line (1-indexed).
    pub start_line: u32,
    /// Last replaced line (1-indexed, inclusive).
    pub end_line: u32,
    /// Replacement text, one entry per line.
    pub replacement_lines: Vec<String>,
    /// Warnings (may be empty).
    pub warnings: Vec<Warning>,
    /// Hash of the original file content.
    pub content_hash: ContentHash,
}

impl ExpandResponse {
    pub fn new(
        file: impl Into<String>,
        edit: LineEdit,
        warnings: Vec<Warning>,
        content_hash: ContentHash,
    ) -> Self {
        ExpandResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            start_line: edit.start_line,
            end_line: edit.end_line,
            replacement_lines: edit.replacement_lines,
            warnings,
            content_hash,
        }
    }

    /// The line edit described by this response.
    pub fn edit(&self) -> LineEdit {
        LineEdit {
            start_line: self.start_line,
            end_line: self.end_line,
            replacement_lines: self.replacement_lines.clone(),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for JSON mode.
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod warning_tests {
        use super::*;

        #[test]
        fn warning_without_location_omits_field() {
            let warning = Warning::new("unresolved_zero_value", "cannot compute zero value");
            let json = serde_json::to_string(&warning).unwrap();
            assert!(!json.contains("location"));
            assert!(!json.contains("suggestion"));
        }

        #[test]
        fn warning_with_location() {
            let warning = Warning::new("mixed_targets", "mixed")
                .at(Location::new("a.go", 4, 2))
                .suggest("name the discarded targets");
            let json = serde_json::to_string(&warning).unwrap();
            assert!(json.contains("\"file\":\"a.go\""));
            assert!(json.contains("\"suggestion\":\"name the discarded targets\""));
        }
    }

    mod response_tests {
        use super::*;

        #[test]
        fn expand_response_status_first() {
            let edit = LineEdit {
                start_line: 3,
                end_line: 3,
                replacement_lines: vec!["x".to_string()],
            };
            let response = ExpandResponse::new(
                "a.go",
                edit.clone(),
                vec![],
                ContentHash::compute(b"abc"),
            );
            let json = serde_json::to_string(&response).unwrap();
            assert!(json.starts_with("{\"status\":\"ok\""));
            assert_eq!(response.edit(), edit);
        }

        #[test]
        fn error_response_carries_reason() {
            let err = IferrError::not_applicable("no_assignment_found", "no assignment");
            let response = ErrorResponse::from_error(&err);
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["status"], "error");
            assert_eq!(json["error"]["code"], 3);
            assert_eq!(json["error"]["details"]["reason"], "no_assignment_found");
        }

        #[test]
        fn format_failure_includes_buffer() {
            let err = IferrError::FormatFailed {
                message: "bad".to_string(),
                buffer: "package p\nfunc {".to_string(),
            };
            let info = ErrorInfo::from_error(&err);
            assert_eq!(info.code, 5);
            assert_eq!(info.details.unwrap()["buffer"], "package p\nfunc {");
        }

        #[test]
        fn emit_response_is_pretty() {
            let mut out = Vec::new();
            emit_response(&ErrorResponse::from_error(&IferrError::internal("x")), &mut out)
                .unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("\n  \"status\": \"error\""));
            assert!(text.ends_with("}\n"));
        }
    }
}
