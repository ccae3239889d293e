//! Registry error types

use uuid::Uuid;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An entry with this id is already registered
    #[error("entry already registered: {0}")]
    DuplicateId(Uuid),

    /// No entry with this id
    #[error("entry not found: {0}")]
    NotFound(Uuid),
}

/// Field-level rejection of a request, in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid ID")]
    InvalidId,

    #[error("Invalid topic")]
    InvalidTopic,

    #[error("Invalid type")]
    InvalidType,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid name")]
    InvalidName,
}
