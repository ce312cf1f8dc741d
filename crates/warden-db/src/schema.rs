//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables use SCHEMAFULL mode. Digests and salts are stored as lowercase
//! hex strings; the session fields are optional and always set or cleared
//! together.

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

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "credential_store",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: credential records
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD identity ON TABLE credential TYPE string;
DEFINE FIELD password_hash ON TABLE credential TYPE string;
DEFINE FIELD salt ON TABLE credential TYPE string;
DEFINE FIELD session_secret_hash ON TABLE credential TYPE option<string>;
DEFINE FIELD session_expires_at ON TABLE credential TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_credential_identity ON TABLE credential \
    COLUMNS identity UNIQUE;
DEFINE INDEX idx_credential_session_expiry ON TABLE credential \
    COLUMNS session_expires_at;
";

/// Apply all pending migrations.
///
/// Creates the `_migration` tracking table if needed, then applies, in
/// order, each migration newer than the highest recorded version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(db, migration).await?;
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

/// Run one migration's DDL and record it in the same request.
async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql)
        .query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {e}",
                migration.version, migration.name,
            ))
        })?;

    info!(version = migration.version, "Migration applied");
    Ok(())
}
