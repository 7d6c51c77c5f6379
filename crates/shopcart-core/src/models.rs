//! Domain models for shopcart.
//!
//! An [`order::Order`] is both the shopping cart and, after checkout, the
//! placed order. Products and users are read-only lookups.

pub mod order;
pub mod product;
pub mod user;
