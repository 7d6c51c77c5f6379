//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The order store is the only
//! writable collection; products and users are read-only lookups from
//! the cart engine's point of view.

use uuid::Uuid;

use crate::error::CartResult;
use crate::models::{
    order::{CreateOrder, Order, OrderStatus},
    product::Product,
    user::User,
};

/// Which open carts to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    /// Carts owned by a user.
    User(Uuid),
    /// Carts under a session id, regardless of owner.
    Session(String),
    /// Carts under a session id that no user has claimed yet.
    AnonymousSession(String),
}

pub trait OrderRepository: Send + Sync {
    /// Insert a new order document and return it with store-assigned fields.
    fn create(&self, input: CreateOrder) -> impl Future<Output = CartResult<Order>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CartResult<Order>> + Send;

    /// Orders matching `lookup` whose status is in `statuses`, oldest first.
    fn find(
        &self,
        lookup: OrderLookup,
        statuses: &[OrderStatus],
    ) -> impl Future<Output = CartResult<Vec<Order>>> + Send;

    /// Replace the stored document with `order` (last writer wins).
    fn save(&self, order: &Order) -> impl Future<Output = CartResult<Order>> + Send;
}

pub trait ProductRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CartResult<Product>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CartResult<User>> + Send;

    /// Look up the internal user behind an identity-provider subject.
    fn get_by_sub(&self, sub: &str) -> impl Future<Output = CartResult<User>> + Send;
}
