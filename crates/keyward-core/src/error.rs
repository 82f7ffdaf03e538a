//! Error types for the persistence contract.

use thiserror::Error;

/// Failure reported by a persistence collaborator.
///
/// `NotFound` is a normal outcome that callers branch on; every other
/// variant is fatal to the operation that observed it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {entity} with key {key}")]
    NotFound { entity: String, key: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
