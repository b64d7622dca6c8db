//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. Numeric identities are handed out by the
//! `_sequence` table, one record per sequence name.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

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

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "credentials",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: credentials and id sequences
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
DEFINE TABLE _sequence SCHEMAFULL;
DEFINE FIELD last_id ON TABLE _sequence TYPE int;

DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD user_id ON TABLE credential TYPE int;
DEFINE FIELD login ON TABLE credential TYPE string \
    ASSERT string::len($value) > 0 AND string::len($value) <= 16;
DEFINE FIELD password_hash ON TABLE credential TYPE string;
DEFINE FIELD created_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_credential_login ON TABLE credential \
    COLUMNS login UNIQUE;
DEFINE INDEX idx_credential_user_id ON TABLE credential \
    COLUMNS user_id UNIQUE;
";

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "could not record v{}: {e}",
                migration.version
            ))
        })?;

    Ok(())
}

/// Apply every migration newer than the recorded schema version.
///
/// Safe to call on every start-up: the tracking table is created with
/// `IF NOT EXISTS` and already-applied versions are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(db, migration).await?;
    }

    info!(
        version = MIGRATIONS.last().map(|m| m.version).unwrap_or(0),
        "Schema up to date"
    );
    Ok(())
}
