//! SurrealDB implementation of [`OrderRepository`].
//!
//! An order is one `shop_order` document. Line items and the status
//! history are embedded arrays, so every save replaces the whole
//! document in a single statement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopcart_core::error::CartResult;
use shopcart_core::models::order::{
    CreateOrder, LineItem, Order, OrderStatus, StatusEntry,
};
use shopcart_core::repository::{OrderLookup, OrderRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct LineItemRow {
    product_id: String,
    quantity: u32,
}

#[derive(Debug, SurrealValue)]
struct StatusEntryRow {
    status: String,
    date: DateTime<Utc>,
    updated_by: Option<String>,
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrderRow {
    user_id: Option<String>,
    session_id: Option<String>,
    products: Vec<LineItemRow>,
    status_history: Vec<StatusEntryRow>,
    order_status: String,
    total_price: Decimal,
    payment_method: Option<String>,
    delivery_address: Option<String>,
    contact_number: Option<String>,
    email: Option<String>,
    special_instructions: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrderRowWithId {
    record_id: String,
    user_id: Option<String>,
    session_id: Option<String>,
    products: Vec<LineItemRow>,
    status_history: Vec<StatusEntryRow>,
    order_status: String,
    total_price: Decimal,
    payment_method: Option<String>,
    delivery_address: Option<String>,
    contact_number: Option<String>,
    email: Option<String>,
    special_instructions: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<OrderStatus, DbError> {
    s.parse()
        .map_err(|_| DbError::Corrupt(format!("unknown order status: {s}")))
}

fn line_to_row(line: &LineItem) -> LineItemRow {
    LineItemRow {
        product_id: line.product_id.to_string(),
        quantity: line.quantity,
    }
}

fn entry_to_row(entry: &StatusEntry) -> StatusEntryRow {
    StatusEntryRow {
        status: entry.status.as_str().to_string(),
        date: entry.date,
        updated_by: entry.updated_by.map(|id| id.to_string()),
    }
}

impl LineItemRow {
    fn try_into_line(self) -> Result<LineItem, DbError> {
        Ok(LineItem {
            product_id: parse_uuid(&self.product_id, "product")?,
            quantity: self.quantity,
        })
    }
}

impl StatusEntryRow {
    fn try_into_entry(self) -> Result<StatusEntry, DbError> {
        Ok(StatusEntry {
            status: parse_status(&self.status)?,
            date: self.date,
            updated_by: self
                .updated_by
                .as_deref()
                .map(|id| parse_uuid(id, "updated_by"))
                .transpose()?,
        })
    }
}

impl OrderRow {
    fn into_order(self, id: Uuid) -> Result<Order, DbError> {
        Ok(Order {
            id,
            user_id: self
                .user_id
                .as_deref()
                .map(|u| parse_uuid(u, "user"))
                .transpose()?,
            session_id: self.session_id,
            products: self
                .products
                .into_iter()
                .map(LineItemRow::try_into_line)
                .collect::<Result<_, _>>()?,
            status_history: self
                .status_history
                .into_iter()
                .map(StatusEntryRow::try_into_entry)
                .collect::<Result<_, _>>()?,
            order_status: parse_status(&self.order_status)?,
            total_price: self.total_price,
            payment_method: self.payment_method,
            delivery_address: self.delivery_address,
            contact_number: self.contact_number,
            email: self.email,
            special_instructions: self.special_instructions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderRowWithId {
    fn try_into_order(self) -> Result<Order, DbError> {
        let id = parse_uuid(&self.record_id, "order")?;
        OrderRow {
            user_id: self.user_id,
            session_id: self.session_id,
            products: self.products,
            status_history: self.status_history,
            order_status: self.order_status,
            total_price: self.total_price,
            payment_method: self.payment_method,
            delivery_address: self.delivery_address,
            contact_number: self.contact_number,
            email: self.email,
            special_instructions: self.special_instructions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_order(id)
    }
}

/// SurrealDB implementation of the Order repository.
#[derive(Clone)]
pub struct SurrealOrderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrderRepository for SurrealOrderRepository<C> {
    async fn create(&self, input: CreateOrder) -> CartResult<Order> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let status = input
            .status_history
            .last()
            .map(|e| e.status)
            .unwrap_or(OrderStatus::Pending);
        let history: Vec<StatusEntryRow> = input.status_history.iter().map(entry_to_row).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('shop_order', $id) SET \
                 user_id = $user_id, \
                 session_id = $session_id, \
                 products = [], \
                 status_history = $status_history, \
                 order_status = $order_status, \
                 total_price = $total_price",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("session_id", input.session_id))
            .bind(("status_history", history))
            .bind(("order_status", status.as_str().to_string()))
            .bind(("total_price", Decimal::ZERO))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        debug!(order_id = %id, "Created order document");
        Ok(row.into_order(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CartResult<Order> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('shop_order', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        Ok(row.into_order(id)?)
    }

    async fn find(&self, lookup: OrderLookup, statuses: &[OrderStatus]) -> CartResult<Vec<Order>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let (filter, key) = match lookup {
            OrderLookup::User(user_id) => ("user_id = $key", user_id.to_string()),
            OrderLookup::Session(session_id) => ("session_id = $key", session_id),
            OrderLookup::AnonymousSession(session_id) => {
                ("session_id = $key AND user_id IS NONE", session_id)
            }
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM shop_order \
             WHERE {filter} AND order_status IN $statuses \
             ORDER BY created_at ASC"
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("key", key))
            .bind(("statuses", statuses))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;

        let orders = rows
            .into_iter()
            .map(|row| row.try_into_order())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(orders)
    }

    async fn save(&self, order: &Order) -> CartResult<Order> {
        let id_str = order.id.to_string();

        let products: Vec<LineItemRow> = order.products.iter().map(line_to_row).collect();
        let history: Vec<StatusEntryRow> = order.status_history.iter().map(entry_to_row).collect();

        let result = self
            .db
            .query(
                "UPDATE type::record('shop_order', $id) SET \
                 user_id = $user_id, \
                 session_id = $session_id, \
                 products = $products, \
                 status_history = $status_history, \
                 order_status = $order_status, \
                 total_price = $total_price, \
                 payment_method = $payment_method, \
                 delivery_address = $delivery_address, \
                 contact_number = $contact_number, \
                 email = $email, \
                 special_instructions = $special_instructions, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", order.user_id.map(|u| u.to_string())))
            .bind(("session_id", order.session_id.clone()))
            .bind(("products", products))
            .bind(("status_history", history))
            .bind(("order_status", order.order_status.as_str().to_string()))
            .bind(("total_price", order.total_price))
            .bind(("payment_method", order.payment_method.clone()))
            .bind(("delivery_address", order.delivery_address.clone()))
            .bind(("contact_number", order.contact_number.clone()))
            .bind(("email", order.email.clone()))
            .bind(("special_instructions", order.special_instructions.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "order".into(),
            id: id_str,
        })?;

        Ok(row.into_order(order.id)?)
    }
}
