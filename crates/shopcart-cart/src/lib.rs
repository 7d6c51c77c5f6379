//! shopcart cart engine: open-cart resolution, line item mutation with
//! recomputed totals, and checkout/complete/cancel transitions.

pub mod config;
pub mod identity;
pub mod service;

pub use config::CartConfig;
pub use identity::CartIdentity;
pub use service::CartService;
