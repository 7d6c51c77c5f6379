//! SurrealDB implementation of [`ProductRepository`].
//!
//! The cart engine only reads prices. Catalog writes ([`create`] and
//! [`set_price`]) live on the concrete repository for seeding and
//! catalog maintenance.
//!
//! [`create`]: SurrealProductRepository::create
//! [`set_price`]: SurrealProductRepository::set_price

use rust_decimal::Decimal;
use shopcart_core::error::CartResult;
use shopcart_core::models::product::{CreateProduct, Price, Product};
use shopcart_core::repository::ProductRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PriceRow {
    amount: Decimal,
    currency: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct ProductRow {
    name: String,
    price: PriceRow,
}

impl ProductRow {
    fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            price: Price {
                amount: self.price.amount,
                currency: self.price.currency,
            },
        }
    }
}

fn price_to_row(price: Price) -> PriceRow {
    PriceRow {
        amount: price.amount,
        currency: price.currency,
    }
}

/// SurrealDB implementation of the Product repository.
#[derive(Clone)]
pub struct SurrealProductRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProductRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateProduct) -> CartResult<Product> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('product', $id) SET \
                 name = $name, price = $price",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("price", price_to_row(input.price)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "product".into(),
            id: id_str,
        })?;

        Ok(row.into_product(id))
    }

    /// Change the catalog price. Carts pick it up on their next mutation.
    pub async fn set_price(&self, id: Uuid, price: Price) -> CartResult<Product> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('product', $id) SET \
                 price = $price, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("price", price_to_row(price)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "product".into(),
            id: id_str,
        })?;

        Ok(row.into_product(id))
    }
}

impl<C: Connection> ProductRepository for SurrealProductRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> CartResult<Product> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('product', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "product".into(),
            id: id_str,
        })?;

        Ok(row.into_product(id))
    }
}
