//! Error types for translation and validation.
//!
//! A [`TranslateError`] is fatal to the single method being translated; the
//! batch session catches it, tallies its message and moves on. Store
//! invariant violations arrive wrapped as [`TranslateError::Core`] and are
//! never recovered from inside the translator.

use mutpeg_core::CoreError;
use thiserror::Error;

/// Reasons a method falls outside the supported language subset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported statement: {construct}")]
    UnsupportedStatement { construct: String },

    #[error("unsupported expression: {construct}")]
    UnsupportedExpression { construct: String },

    #[error("invalid assignment target: {target}")]
    InvalidAssignmentTarget { target: String },

    #[error("integer literal out of range: {value}")]
    LiteralOutOfRange { value: i64 },

    #[error("invalid return: {reason}")]
    InvalidReturn { reason: String },

    #[error("SIMPLE programs cannot return multiple times")]
    MultipleReturns,
}

/// Errors raised while translating a method into a PEG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("unrecognized {kind} operator: {symbol}")]
    UnrecognizedOperator { kind: String, symbol: String },

    #[error("SIMPLE programs cannot return multiple times")]
    MultipleReturns,

    #[error("invalid return: {reason}")]
    InvalidReturn { reason: String },

    #[error("unsupported construct: {construct}")]
    Unsupported { construct: String },

    #[error("invalid integer literal: {text}")]
    InvalidLiteral { text: String },

    #[error("method not found: {signature}")]
    MethodNotFound { signature: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TranslateError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        TranslateError::Unsupported {
            construct: construct.into(),
        }
    }
}
