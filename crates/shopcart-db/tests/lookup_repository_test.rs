//! Integration tests for the Product and User lookups using in-memory
//! SurrealDB.

use rust_decimal::Decimal;
use shopcart_core::error::CartError;
use shopcart_core::models::product::{CreateProduct, Price};
use shopcart_core::models::user::CreateUser;
use shopcart_core::repository::{ProductRepository, UserRepository};
use shopcart_db::repository::{SurrealProductRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shopcart_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_get_product() {
    let repo = SurrealProductRepository::new(setup().await);

    let product = repo
        .create(CreateProduct {
            name: "Espresso beans".into(),
            price: Price {
                amount: Decimal::new(1299, 2),
                currency: Some("EUR".into()),
            },
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(product.id).await.unwrap();
    assert_eq!(fetched.name, "Espresso beans");
    assert_eq!(fetched.price.amount, Decimal::new(1299, 2));
    assert_eq!(fetched.price.currency.as_deref(), Some("EUR"));
}

#[tokio::test]
async fn set_price_changes_catalog_price() {
    let repo = SurrealProductRepository::new(setup().await);
    let product = repo
        .create(CreateProduct {
            name: "Mug".into(),
            price: Price {
                amount: Decimal::new(8, 0),
                currency: None,
            },
        })
        .await
        .unwrap();

    repo.set_price(
        product.id,
        Price {
            amount: Decimal::new(10, 0),
            currency: None,
        },
    )
    .await
    .unwrap();

    let fetched = repo.get_by_id(product.id).await.unwrap();
    assert_eq!(fetched.price.amount, Decimal::new(10, 0));
    assert!(fetched.price.currency.is_none());
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let repo = SurrealProductRepository::new(setup().await);
    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound { ref entity, .. } if entity == "product"));
}

#[tokio::test]
async fn user_lookup_by_sub_and_id() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo
        .create(CreateUser {
            sub: "auth0|alice".into(),
        })
        .await
        .unwrap();

    let by_sub = repo.get_by_sub("auth0|alice").await.unwrap();
    assert_eq!(by_sub.id, user.id);

    let by_id = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(by_id.sub, "auth0|alice");

    let err = repo.get_by_sub("auth0|bob").await.unwrap_err();
    assert!(matches!(err, CartError::NotFound { .. }));
}
