//! Runner error types.

use shopcart_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

impl From<surrealdb::Error> for ServerError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Db(DbError::from(err))
    }
}
