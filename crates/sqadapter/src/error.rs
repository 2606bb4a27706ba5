//! Error types for the adapter.

use sqadapter_core::{CoreError, DecodeError};
use sqadapter_model::ModelError;
use sqadapter_store::StoreError;
use thiserror::Error;

/// Errors that can occur during adapter operations.
///
/// Store errors pass through unchanged; nothing is retried or suppressed.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A stored segment could not be read back as a rule.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Rejected before any store call, e.g. a filter reaching past `v5`.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The policy model refused a loaded line.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl AdapterError {
    /// Whether this error was raised for a malformed argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AdapterError::Core(CoreError::InvalidArgument { .. }))
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
