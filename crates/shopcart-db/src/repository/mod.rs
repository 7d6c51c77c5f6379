//! SurrealDB repository implementations.

mod order;
mod product;
mod user;

pub use order::SurrealOrderRepository;
pub use product::SurrealProductRepository;
pub use user::SurrealUserRepository;

use uuid::Uuid;

use crate::error::DbError;

/// UUIDs are stored as strings; a malformed one means the record is corrupt.
fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {field} UUID: {e}")))
}
