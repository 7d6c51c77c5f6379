//! Order lifecycle state machine.
//!
//! ```text
//! pending ──checkout──▶ checkout ──complete──▶ completed
//!    │                     │
//!    └──────cancel─────────┴──────▶ cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal. Every transition goes through
//! [`Order::apply_transition`], which validates the move, sets the new
//! status and appends the audit entry in a single call. A rejected
//! transition leaves the order untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::models::order::{CheckoutDetails, Order, OrderStatus, StatusEntry};

/// Every operation that can be attempted against an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CartOperation {
    AddItem,
    RemoveItem,
    SetQuantity,
    Checkout,
    Complete,
    Cancel,
}

impl CartOperation {
    pub fn is_item_mutation(&self) -> bool {
        matches!(self, Self::AddItem | Self::RemoveItem | Self::SetQuantity)
    }

    /// Status reached when `self` is applied in status `from`, or `None`
    /// if the move is illegal. Item mutations keep the current status.
    pub fn target(&self, from: OrderStatus) -> Option<OrderStatus> {
        use OrderStatus::*;

        if from.is_terminal() {
            return None;
        }
        match (self, from) {
            (op, status) if op.is_item_mutation() => Some(status),
            (Self::Checkout, Pending) => Some(Checkout),
            (Self::Complete, Checkout) => Some(Completed),
            (Self::Cancel, Pending | Checkout) => Some(Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddItem => "add item to",
            Self::RemoveItem => "remove item from",
            Self::SetQuantity => "set item quantity on",
            Self::Checkout => "check out",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        })
    }
}

impl Order {
    /// Fail with [`CartError::InvalidState`] unless `op` is legal now.
    pub fn ensure_allows(&self, op: CartOperation) -> CartResult<OrderStatus> {
        op.target(self.order_status)
            .ok_or(CartError::InvalidState {
                operation: op,
                status: self.order_status,
            })
    }

    /// Move to the status `op` leads to and record it in the history.
    ///
    /// Returns the new status.
    pub fn apply_transition(
        &mut self,
        op: CartOperation,
        updated_by: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> CartResult<OrderStatus> {
        let next = self.ensure_allows(op)?;
        self.order_status = next;
        self.record_status(updated_by, at);
        Ok(next)
    }

    /// pending → checkout, capturing the delivery and contact details.
    pub fn checkout(
        &mut self,
        details: CheckoutDetails,
        updated_by: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> CartResult<()> {
        self.ensure_allows(CartOperation::Checkout)?;

        self.payment_method = Some(details.payment_method);
        self.delivery_address = Some(details.delivery_address);
        self.contact_number = Some(details.contact_number);
        self.email = Some(details.email);
        self.special_instructions = details.special_instructions;
        self.apply_transition(CartOperation::Checkout, updated_by, at)?;
        Ok(())
    }

    /// checkout → completed.
    pub fn complete(&mut self, updated_by: Option<Uuid>, at: DateTime<Utc>) -> CartResult<()> {
        self.apply_transition(CartOperation::Complete, updated_by, at)
            .map(|_| ())
    }

    /// pending | checkout → cancelled.
    pub fn cancel(&mut self, updated_by: Option<Uuid>, at: DateTime<Utc>) -> CartResult<()> {
        self.apply_transition(CartOperation::Cancel, updated_by, at)
            .map(|_| ())
    }

    /// Append the current status to the history unless it is already the
    /// latest entry. Returns whether an entry was appended.
    pub fn record_status(&mut self, updated_by: Option<Uuid>, at: DateTime<Utc>) -> bool {
        let unchanged = self
            .status_history
            .last()
            .is_some_and(|last| last.status == self.order_status);
        if unchanged {
            return false;
        }

        self.status_history.push(StatusEntry {
            status: self.order_status,
            date: at,
            updated_by,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::order::CreateOrder;

    fn pending_order() -> Order {
        let now = Utc::now();
        let create = CreateOrder::new_cart(Some(Uuid::new_v4()), None, now);
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

    fn details() -> CheckoutDetails {
        CheckoutDetails {
            payment_method: "card".into(),
            delivery_address: "1 Main St".into(),
            contact_number: "+15550100".into(),
            email: "shopper@example.com".into(),
            special_instructions: Some("leave at door".into()),
        }
    }

    #[test]
    fn transition_table() {
        use CartOperation as Op;
        use OrderStatus::*;

        assert_eq!(Op::Checkout.target(Pending), Some(Checkout));
        assert_eq!(Op::Checkout.target(Checkout), None);
        assert_eq!(Op::Complete.target(Checkout), Some(Completed));
        assert_eq!(Op::Complete.target(Pending), None);
        assert_eq!(Op::Cancel.target(Pending), Some(Cancelled));
        assert_eq!(Op::Cancel.target(Checkout), Some(Cancelled));
        assert_eq!(Op::AddItem.target(Checkout), Some(Checkout));

        for terminal in [Completed, Cancelled] {
            for op in [
                Op::AddItem,
                Op::RemoveItem,
                Op::SetQuantity,
                Op::Checkout,
                Op::Complete,
                Op::Cancel,
            ] {
                assert_eq!(op.target(terminal), None, "{op:?} from {terminal}");
            }
        }
    }

    #[test]
    fn checkout_then_complete_appends_two_entries() {
        let mut order = pending_order();
        let actor = Uuid::new_v4();

        order.checkout(details(), Some(actor), Utc::now()).unwrap();
        order.complete(None, Utc::now()).unwrap();

        let statuses: Vec<_> = order.status_history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Checkout,
                OrderStatus::Completed
            ]
        );
        assert_eq!(order.status_history[1].updated_by, Some(actor));
        assert_eq!(order.status_history[2].updated_by, None);
        assert_eq!(order.payment_method.as_deref(), Some("card"));
    }

    #[test]
    fn rejected_checkout_mutates_nothing() {
        let mut order = pending_order();
        order.cancel(None, Utc::now()).unwrap();
        let history_len = order.status_history.len();

        let err = order.checkout(details(), None, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidState {
                operation: CartOperation::Checkout,
                status: OrderStatus::Cancelled,
            }
        ));
        assert_eq!(order.status_history.len(), history_len);
        assert!(order.payment_method.is_none());
        assert!(order.email.is_none());
    }

    #[test]
    fn complete_requires_checkout() {
        let mut order = pending_order();
        let err = order.complete(None, Utc::now()).unwrap_err();
        assert!(matches!(err, CartError::InvalidState { .. }));
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
    }

    #[test]
    fn cancel_twice_is_rejected() {
        let mut order = pending_order();
        order.cancel(None, Utc::now()).unwrap();
        assert!(order.cancel(None, Utc::now()).is_err());
        assert_eq!(order.status_history.len(), 2);
    }

    #[test]
    fn record_status_does_not_duplicate_latest() {
        let mut order = pending_order();
        assert!(!order.record_status(None, Utc::now()));
        assert_eq!(order.status_history.len(), 1);

        order.order_status = OrderStatus::Checkout;
        assert!(order.record_status(None, Utc::now()));
        assert!(!order.record_status(None, Utc::now()));
        assert_eq!(order.status_history.len(), 2);
    }
}
