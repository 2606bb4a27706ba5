//! Error types for sqadapter core.

use thiserror::Error;

/// Core errors raised before any store interaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid argument: field offset {offset} with {len} values exceeds {max} rule fields")]
    InvalidArgument { offset: usize, len: usize, max: usize },

    #[error("invalid index definition: {0}")]
    InvalidSchema(String),

    #[error("invalid rule id: {0}")]
    InvalidRuleId(String),
}

/// Errors turning a stored segment back into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown field {0:?} in segment")]
    UnknownField(String),

    #[error("field {0:?} appears more than once")]
    DuplicateField(String),

    #[error("field {field:?} has type {actual}, expected {expected}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("segment has no ptype")]
    MissingPtype,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
