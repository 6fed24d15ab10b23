// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use iferr_core::patch::Span;
use thiserror::Error;

use crate::tokenizer::TokError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("tokenizer error: {0}")]
    TokenizerError(#[from] TokError),
    #[error("{message}")]
    SyntaxError { message: String, span: Span },
}

impl ParserError {
    /// Byte span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParserError::TokenizerError(e) => Span::new(e.offset, e.offset),
            ParserError::SyntaxError { span, .. } => *span,
        }
    }

    /// Message without the error-kind prefix.
    pub fn message(&self) -> &str {
        match self {
            ParserError::TokenizerError(e) => &e.message,
            ParserError::SyntaxError { message, .. } => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;
