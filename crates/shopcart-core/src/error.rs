//! Error types for the shopcart system.

use thiserror::Error;

use crate::lifecycle::CartOperation;
use crate::models::order::OrderStatus;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Cannot {operation} an order in status {status}")]
    InvalidState {
        operation: CartOperation,
        status: OrderStatus,
    },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl CartError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Transport-neutral status class for the error.
    ///
    /// Handlers map this onto their own response codes.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::InvalidState { .. } => 409,
            Self::Infrastructure(_) => 500,
        }
    }
}

pub type CartResult<T> = Result<T, CartError>;
