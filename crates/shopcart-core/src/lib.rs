//! shopcart core: order/cart domain models, the order lifecycle state
//! machine, repository traits and the shared error type.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;

pub use error::{CartError, CartResult};
pub use lifecycle::CartOperation;
