//! Order domain model.
//!
//! The same document represents the shopping cart before checkout and the
//! placed order afterwards; [`OrderStatus`] distinguishes the phase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::lifecycle::CartOperation;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Checkout,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses in which a cart is still open for its shopper.
    pub const OPEN: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Checkout];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Checkout => "checkout",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "checkout" => Ok(Self::Checkout),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CartError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// One product line in an order. `quantity` is never zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// An entry in the append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub products: Vec<LineItem>,
    pub status_history: Vec<StatusEntry>,
    pub order_status: OrderStatus,
    /// Derived from `products` and live catalog prices; never trusted on read.
    pub total_price: Decimal,
    pub payment_method: Option<String>,
    pub delivery_address: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a brand-new cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub status_history: Vec<StatusEntry>,
}

impl CreateOrder {
    /// An empty pending cart for the given identity.
    pub fn new_cart(user_id: Option<Uuid>, session_id: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            session_id,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                date: at,
                updated_by: None,
            }],
        }
    }
}

/// Contact and delivery details captured by the checkout transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    pub payment_method: String,
    pub delivery_address: String,
    pub contact_number: String,
    pub email: String,
    pub special_instructions: Option<String>,
}

impl Order {
    pub fn line(&self, product_id: Uuid) -> Option<&LineItem> {
        self.products.iter().find(|l| l.product_id == product_id)
    }

    /// Add `quantity` units of a product, merging into an existing line.
    pub fn add_line(&mut self, product_id: Uuid, quantity: u32) -> CartResult<()> {
        self.ensure_allows(CartOperation::AddItem)?;
        if quantity == 0 {
            return Err(CartError::validation("quantity must be at least 1"));
        }

        match self.products.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| CartError::validation("quantity overflow"))?;
            }
            None => self.products.push(LineItem {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Remove one unit of a product; the line goes away at zero.
    ///
    /// Removing a product that is not in the cart leaves the lines untouched.
    pub fn remove_one(&mut self, product_id: Uuid) -> CartResult<()> {
        self.ensure_allows(CartOperation::RemoveItem)?;

        if let Some(line) = self.products.iter_mut().find(|l| l.product_id == product_id) {
            if line.quantity > 1 {
                line.quantity -= 1;
                return Ok(());
            }
        }
        self.products.retain(|l| l.product_id != product_id);
        Ok(())
    }

    /// Overwrite the quantity of an existing line. Zero drops the line;
    /// an absent line is not created.
    pub fn set_line_quantity(&mut self, product_id: Uuid, quantity: u32) -> CartResult<()> {
        self.ensure_allows(CartOperation::SetQuantity)?;

        if quantity == 0 {
            self.products.retain(|l| l.product_id != product_id);
        } else if let Some(line) = self.products.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Order {
        let now = Utc::now();
        let create = CreateOrder::new_cart(None, Some("s-1".into()), now);
        Order {
            id: Uuid::new_v4(),
            user_id: create.user_id,
            session_id: create.session_id,
            products: Vec::new(),
            status_history: create.status_history,
            order_status: OrderStatus::Pending,
            total_price: Decimal::ZERO,
            payment_method: None,
            delivery_address: None,
            contact_number: None,
            email: None,
            special_instructions: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Checkout,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn add_merges_into_existing_line() {
        let mut order = cart();
        let p = Uuid::new_v4();
        order.add_line(p, 2).unwrap();
        order.add_line(p, 3).unwrap();

        assert_eq!(order.products.len(), 1);
        assert_eq!(order.line(p).unwrap().quantity, 5);
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut order = cart();
        let err = order.add_line(Uuid::new_v4(), 0).unwrap_err();
        assert!(matches!(err, CartError::Validation { .. }));
        assert!(order.products.is_empty());
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut order = cart();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        order.add_line(a, 1).unwrap();
        order.add_line(b, 1).unwrap();
        order.add_line(a, 1).unwrap();

        let ids: Vec<_> = order.products.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn remove_decrements_one_unit_at_a_time() {
        let mut order = cart();
        let p = Uuid::new_v4();
        order.add_line(p, 3).unwrap();

        order.remove_one(p).unwrap();
        assert_eq!(order.line(p).unwrap().quantity, 2);

        order.remove_one(p).unwrap();
        order.remove_one(p).unwrap();
        assert!(order.line(p).is_none());
    }

    #[test]
    fn remove_absent_line_is_noop() {
        let mut order = cart();
        let p = Uuid::new_v4();
        order.add_line(p, 1).unwrap();
        order.remove_one(Uuid::new_v4()).unwrap();
        assert_eq!(order.products.len(), 1);
    }

    #[test]
    fn set_quantity_overwrites_without_creating() {
        let mut order = cart();
        let (p, q) = (Uuid::new_v4(), Uuid::new_v4());
        order.add_line(p, 4).unwrap();

        order.set_line_quantity(p, 1).unwrap();
        assert_eq!(order.line(p).unwrap().quantity, 1);

        order.set_line_quantity(q, 7).unwrap();
        assert!(order.line(q).is_none());

        order.set_line_quantity(p, 0).unwrap();
        assert!(order.products.is_empty());
    }

    #[test]
    fn terminal_order_rejects_item_mutations_without_change() {
        let mut order = cart();
        let p = Uuid::new_v4();
        order.add_line(p, 2).unwrap();
        order.order_status = OrderStatus::Completed;
        let before = order.products.clone();

        assert!(matches!(
            order.add_line(p, 1).unwrap_err(),
            CartError::InvalidState { .. }
        ));
        assert!(matches!(
            order.remove_one(p).unwrap_err(),
            CartError::InvalidState { .. }
        ));
        assert!(matches!(
            order.set_line_quantity(p, 9).unwrap_err(),
            CartError::InvalidState { .. }
        ));
        assert_eq!(order.products, before);
    }

    #[test]
    fn serializes_camel_case_and_skips_missing_actor() {
        let order = cart();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderStatus"], "pending");
        assert!(json["statusHistory"][0].get("updatedBy").is_none());
        assert_eq!(json["sessionId"], "s-1");
    }
}
