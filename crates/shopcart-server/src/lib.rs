//! shopcart request layer: event parsing, body validation, routing to
//! the cart engine and error-to-status translation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use handlers::App;
pub use http::{HttpRequest, HttpResponse};
