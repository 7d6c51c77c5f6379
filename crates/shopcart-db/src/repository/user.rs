//! SurrealDB implementation of [`UserRepository`].

use shopcart_core::error::CartResult;
use shopcart_core::models::user::{CreateUser, User};
use shopcart_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRow {
    sub: String,
}

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    sub: String,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid(&self.record_id, "user")?,
            sub: self.sub,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Register the internal user for an identity-provider subject.
    pub async fn create(&self, input: CreateUser) -> CartResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query("CREATE type::record('user', $id) SET sub = $sub")
            .bind(("id", id_str.clone()))
            .bind(("sub", input.sub))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(User { id, sub: row.sub })
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> CartResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(User { id, sub: row.sub })
    }

    async fn get_by_sub(&self, sub: &str) -> CartResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE sub = $sub")
            .bind(("sub", sub.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("sub={sub}"),
        })?;

        Ok(row.try_into_user()?)
    }
}
