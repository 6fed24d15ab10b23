//! Error bridge implementations into the unified `IferrError`.
//!
//! The conversions live here rather than in `iferr-core` because they name
//! engine types that core does not know about.

use iferr_core::error::IferrError;

use crate::files::FileError;
use crate::lookup::LookupError;
use crate::ops::ExpandError;
use crate::signature::SignatureError;

// ============================================================================
// Bridge: ExpandError -> IferrError
// ============================================================================

impl From<ExpandError> for IferrError {
    fn from(err: ExpandError) -> Self {
        match err {
            ExpandError::Parse {
                file,
                line,
                col,
                message,
                ..
            } => IferrError::ParseFailed {
                file,
                line,
                col,
                message,
            },
            ExpandError::Lookup(err) => IferrError::from(err),
            ExpandError::Signature(err) => IferrError::from(err),
            ExpandError::NoAssignmentFound { .. } => {
                IferrError::not_applicable("no_assignment_found", err.to_string())
            }
            ExpandError::InvalidOption { message } => IferrError::invalid_args(message),
            ExpandError::Reformat(err) => IferrError::FormatFailed {
                message: err.message,
                buffer: err.buffer,
            },
            ExpandError::File(err) => IferrError::from(err),
        }
    }
}

// ============================================================================
// Bridge: LookupError / SignatureError -> IferrError
// ============================================================================

impl From<LookupError> for IferrError {
    fn from(err: LookupError) -> Self {
        let reason = match err {
            LookupError::PositionNotFound { .. } => "position_not_found",
            LookupError::AmbiguousSelection { .. } => "ambiguous_selection",
            LookupError::NoCallExpression { .. } => "no_call_expression",
            LookupError::File(err) => return IferrError::from(err),
        };
        IferrError::not_applicable(reason, err.to_string())
    }
}

impl From<SignatureError> for IferrError {
    fn from(err: SignatureError) -> Self {
        let reason = match &err {
            SignatureError::BuiltinCallRejected { .. } => "builtin_call_rejected",
            SignatureError::UnknownSignature { .. } => "unknown_signature",
            SignatureError::NoEnclosingFunction => "no_enclosing_function",
            SignatureError::NoReturnValues { .. } => "no_return_values",
        };
        IferrError::not_applicable(reason, err.to_string())
    }
}

impl From<FileError> for IferrError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => IferrError::file_not_found(path),
            FileError::Io { .. } => IferrError::internal(err.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
