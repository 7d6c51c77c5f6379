//! Database-specific error types and conversions.

use shopcart_core::error::CartError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for CartError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CartError::NotFound { entity, id },
            other => CartError::Infrastructure(other.to_string()),
        }
    }
}
