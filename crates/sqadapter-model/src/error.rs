//! Error types for the policy model.

use thiserror::Error;

/// Errors that can occur while loading rules into a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The ptype does not belong to the `p` or `g` section.
    #[error("unknown section for ptype {0:?}")]
    UnknownSection(String),

    /// The ptype is not declared by the model.
    #[error("ptype {0:?} is not declared by the model")]
    UnknownPtype(String),

    /// A policy line carried a ptype but no values.
    #[error("policy line for {0:?} has no values")]
    EmptyRule(String),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
