//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as lowercase strings
//! with ASSERT constraints for validation. Line items and status history
//! are embedded arrays inside the order document.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "open_cart_lookup_indexes",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (read-only to the cart engine)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD sub ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_sub ON TABLE user COLUMNS sub UNIQUE;

-- =======================================================================
-- Products (read-only to the cart engine)
-- =======================================================================
DEFINE TABLE product SCHEMAFULL;
DEFINE FIELD name ON TABLE product TYPE string;
DEFINE FIELD price ON TABLE product TYPE object;
DEFINE FIELD price.amount ON TABLE product TYPE decimal \
    ASSERT $value >= 0;
DEFINE FIELD price.currency ON TABLE product TYPE option<string>;
DEFINE FIELD created_at ON TABLE product TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE product TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Orders (cart before checkout, order after)
-- =======================================================================
DEFINE TABLE shop_order SCHEMAFULL;
DEFINE FIELD user_id ON TABLE shop_order TYPE option<string>;
DEFINE FIELD session_id ON TABLE shop_order TYPE option<string>;
DEFINE FIELD products ON TABLE shop_order TYPE array<object> \
    DEFAULT [];
DEFINE FIELD products[*].product_id ON TABLE shop_order TYPE string;
DEFINE FIELD products[*].quantity ON TABLE shop_order TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD status_history ON TABLE shop_order TYPE array<object> \
    DEFAULT [];
DEFINE FIELD status_history[*].status ON TABLE shop_order TYPE string \
    ASSERT $value IN ['pending', 'checkout', 'completed', 'cancelled'];
DEFINE FIELD status_history[*].date ON TABLE shop_order TYPE datetime;
DEFINE FIELD status_history[*].updated_by ON TABLE shop_order \
    TYPE option<string>;
DEFINE FIELD order_status ON TABLE shop_order TYPE string \
    ASSERT $value IN ['pending', 'checkout', 'completed', 'cancelled'];
DEFINE FIELD total_price ON TABLE shop_order TYPE decimal;
DEFINE FIELD payment_method ON TABLE shop_order TYPE option<string>;
DEFINE FIELD delivery_address ON TABLE shop_order TYPE option<string>;
DEFINE FIELD contact_number ON TABLE shop_order TYPE option<string>;
DEFINE FIELD email ON TABLE shop_order TYPE option<string>;
DEFINE FIELD special_instructions ON TABLE shop_order \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE shop_order TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE shop_order TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Schema v2: lookup indexes for open-cart resolution
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE INDEX idx_order_user_status ON TABLE shop_order \
    COLUMNS user_id, order_status;
DEFINE INDEX idx_order_session_status ON TABLE shop_order \
    COLUMNS session_id, order_status;
";

/// Highest applied migration version; `0` on a fresh database.
pub async fn schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

/// Bring the database up to the latest schema.
///
/// Each pending migration runs in one transaction together with its
/// `_migration` record, so a failed step leaves neither behind.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = schema_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        info!(version = current, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
        info!(
            version = migration.version,
            name = migration.name,
            "Migration applied"
        );
    }

    Ok(())
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let sql = format!(
        "BEGIN TRANSACTION;\n{}\nCREATE _migration SET version = $version, name = $name;\nCOMMIT TRANSACTION;",
        migration.sql
    );

    db.query(sql)
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}': {e}",
                migration.version, migration.name
            ))
        })?;
    Ok(())
}
