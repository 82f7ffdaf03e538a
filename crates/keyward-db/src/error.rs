//! Database-specific error types and conversions.

use keyward_core::error::StoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a failed write statement.
    ///
    /// SurrealDB reports a `CREATE` on an existing record id only through
    /// its message.
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already exists") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, key: id },
            DbError::AlreadyExists { entity } => StoreError::AlreadyExists { entity },
            other => StoreError::Persistence(other.to_string()),
        }
    }
}
