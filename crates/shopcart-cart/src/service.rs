//! Cart service: open-cart resolution, item mutation and checkout
//! orchestration.

use chrono::Utc;
use rust_decimal::Decimal;
use shopcart_core::error::{CartError, CartResult};
use shopcart_core::models::order::{CheckoutDetails, CreateOrder, LineItem, Order, OrderStatus};
use shopcart_core::repository::{OrderLookup, OrderRepository, ProductRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CartConfig;
use crate::identity::CartIdentity;

/// Cart service.
///
/// Generic over repository implementations so that the cart engine
/// has no dependency on the database crate. Holds no per-shopper state:
/// every call resolves the cart from the store again.
pub struct CartService<O: OrderRepository, P: ProductRepository> {
    orders: O,
    products: P,
    config: CartConfig,
}

impl<O: OrderRepository, P: ProductRepository> CartService<O, P> {
    pub fn new(orders: O, products: P, config: CartConfig) -> Self {
        Self {
            orders,
            products,
            config,
        }
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    /// Return the single open cart for `identity`, creating it if needed.
    ///
    /// A signed-in shopper first gets their own open cart; failing that,
    /// an unclaimed cart started under the same session is attached to
    /// them. Anonymous callers are matched by session alone.
    pub async fn resolve_or_create(&self, identity: &CartIdentity) -> CartResult<Order> {
        if let Some(user_id) = identity.user_id {
            if let Some(cart) = self.find_open(OrderLookup::User(user_id)).await? {
                debug!(order_id = %cart.id, user_id = %user_id, "Resolved cart by user");
                return Ok(cart);
            }

            if let Some(session_id) = &identity.session_id {
                let lookup = OrderLookup::AnonymousSession(session_id.clone());
                if let Some(mut cart) = self.find_open(lookup).await? {
                    cart.user_id = Some(user_id);
                    let cart = self.orders.save(&cart).await?;
                    info!(
                        order_id = %cart.id,
                        user_id = %user_id,
                        session_id = %session_id,
                        "Attached session cart to user"
                    );
                    return Ok(cart);
                }
            }
        } else if let Some(session_id) = &identity.session_id {
            let lookup = OrderLookup::Session(session_id.clone());
            if let Some(cart) = self.find_open(lookup).await? {
                debug!(order_id = %cart.id, session_id = %session_id, "Resolved cart by session");
                return Ok(cart);
            }
        }

        let cart = self
            .orders
            .create(CreateOrder::new_cart(
                identity.user_id,
                identity.session_id.clone(),
                Utc::now(),
            ))
            .await?;

        info!(
            order_id = %cart.id,
            user_id = ?identity.user_id,
            session_id = ?identity.session_id,
            "Created cart"
        );
        Ok(cart)
    }

    /// Same as [`resolve_or_create`](Self::resolve_or_create); reading a
    /// cart creates it when none is open.
    pub async fn get_details(&self, identity: &CartIdentity) -> CartResult<Order> {
        self.resolve_or_create(identity).await
    }

    pub async fn get_products(&self, identity: &CartIdentity) -> CartResult<Vec<LineItem>> {
        Ok(self.resolve_or_create(identity).await?.products)
    }

    /// Add `quantity` units of a product, merging into an existing line.
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        product_id: Uuid,
        quantity: u32,
    ) -> CartResult<Order> {
        if quantity == 0 {
            return Err(CartError::validation("quantity must be at least 1"));
        }
        // Surface an unknown product before touching the cart.
        self.products.get_by_id(product_id).await?;

        let mut cart = self.resolve_or_create(identity).await?;
        cart.add_line(product_id, quantity)?;

        debug!(order_id = %cart.id, product_id = %product_id, quantity, "Adding item");
        self.persist_items(cart).await
    }

    /// Remove one unit of a product; the line is dropped at zero.
    pub async fn remove_item(&self, identity: &CartIdentity, product_id: Uuid) -> CartResult<Order> {
        let mut cart = self.resolve_or_create(identity).await?;
        cart.remove_one(product_id)?;

        debug!(order_id = %cart.id, product_id = %product_id, "Removing one unit");
        self.persist_items(cart).await
    }

    /// Overwrite the quantity of an existing line; absent lines are not
    /// created.
    pub async fn set_item_quantity(
        &self,
        identity: &CartIdentity,
        product_id: Uuid,
        quantity: u32,
    ) -> CartResult<Order> {
        let mut cart = self.resolve_or_create(identity).await?;
        cart.set_line_quantity(product_id, quantity)?;

        debug!(order_id = %cart.id, product_id = %product_id, quantity, "Setting item quantity");
        self.persist_items(cart).await
    }

    /// pending → checkout with delivery and contact details.
    pub async fn checkout(
        &self,
        identity: &CartIdentity,
        details: CheckoutDetails,
        updated_by: Option<Uuid>,
    ) -> CartResult<Order> {
        let mut cart = self.resolve_or_create(identity).await?;
        cart.checkout(details, updated_by, Utc::now())?;
        self.persist_transition(cart).await
    }

    /// checkout → completed.
    pub async fn complete(
        &self,
        identity: &CartIdentity,
        updated_by: Option<Uuid>,
    ) -> CartResult<Order> {
        let mut cart = self.resolve_or_create(identity).await?;
        cart.complete(updated_by, Utc::now())?;
        self.persist_transition(cart).await
    }

    /// pending | checkout → cancelled.
    pub async fn cancel(
        &self,
        identity: &CartIdentity,
        updated_by: Option<Uuid>,
    ) -> CartResult<Order> {
        let mut cart = self.resolve_or_create(identity).await?;
        cart.cancel(updated_by, Utc::now())?;
        self.persist_transition(cart).await
    }

    /// Sum of live unit price × quantity over all lines.
    ///
    /// A line whose price cannot be read contributes zero rather than
    /// failing the whole computation (see [`CartConfig::strict_price_lookup`]).
    /// A total beyond `Decimal` range is a `Validation` error.
    pub async fn compute_total_price(&self, products: &[LineItem]) -> CartResult<Decimal> {
        let mut total = Decimal::ZERO;

        for line in products {
            match self.products.get_by_id(line.product_id).await {
                Ok(product) => {
                    total = product
                        .price
                        .amount
                        .checked_mul(Decimal::from(line.quantity))
                        .and_then(|subtotal| total.checked_add(subtotal))
                        .ok_or_else(|| {
                            CartError::validation(format!(
                                "order total overflows for product {}",
                                line.product_id
                            ))
                        })?;
                }
                Err(e @ CartError::Infrastructure(_)) if self.config.strict_price_lookup => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        product_id = %line.product_id,
                        error = %e,
                        "Price lookup failed; line counts as zero"
                    );
                }
            }
        }

        Ok(total)
    }

    /// Oldest open cart for `lookup`, if any.
    async fn find_open(&self, lookup: OrderLookup) -> CartResult<Option<Order>> {
        let carts = self.orders.find(lookup, &OrderStatus::OPEN).await?;
        if carts.len() > 1 {
            warn!(
                count = carts.len(),
                order_id = %carts[0].id,
                "Several open carts for one identity; using the oldest"
            );
        }
        Ok(carts.into_iter().next())
    }

    async fn persist_items(&self, mut cart: Order) -> CartResult<Order> {
        cart.total_price = self.compute_total_price(&cart.products).await?;
        self.orders.save(&cart).await
    }

    async fn persist_transition(&self, cart: Order) -> CartResult<Order> {
        let cart = self.orders.save(&cart).await?;
        info!(order_id = %cart.id, status = %cart.order_status, "Order status changed");
        Ok(cart)
    }
}
