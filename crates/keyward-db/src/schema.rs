//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Credentials are keyed by
//! principal id and sessions by token digest, so every lookup is a
//! direct record fetch.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

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
struct AppliedMigration {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "credentials_and_sessions",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Credentials (record id = principal id)
-- =======================================================================
DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD principal_id ON TABLE credential TYPE string;
DEFINE FIELD password_hash ON TABLE credential TYPE string \
    ASSERT string::starts_with($value, '$');
DEFINE FIELD created_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Sessions (record id = SHA-256 of the raw token)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD principal_id ON TABLE session TYPE string;
DEFINE FIELD created_at ON TABLE session TYPE datetime;
DEFINE FIELD last_used_at ON TABLE session TYPE option<datetime>;
DEFINE INDEX idx_session_principal ON TABLE session \
    COLUMNS principal_id;
";

/// Bring the schema up to date and return how many migrations ran.
///
/// Safe to call on every start: migrations at or below the recorded
/// version are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("migration table: {e}")))?;

    let current = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        debug!(version = current, "Schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        apply(db, migration).await?;
    }
    Ok(pending.len())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let latest: Option<AppliedMigration> = result.take(0)?;
    Ok(latest.map_or(0, |m| m.version))
}

/// Run one migration and record it in the same request.
async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(version = migration.version, name = migration.name, "Applying migration");
    db.query(migration.sql)
        .query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "v{} ({}): {e}",
                migration.version, migration.name
            ))
        })?;
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
