//! Migration runner
//!
//! Applies migrations with checksums, drift detection, and idempotency

use rusqlite::{Connection, OptionalExtension};

use crate::errors::{
    checksum_mismatch, from_rusqlite, migration_error, store_unreachable, unknown_migration, Result,
};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::get_migrations;

/// A migration recorded in `schema_version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub migration_id: String,
    pub applied_at: i64,
    pub checksum: String,
}

/// Apply all pending migrations to the database
///
/// Returns the number of migrations applied by this call (0 when the
/// schema is already current).
///
/// # Errors
/// * `Schema` - If a recorded migration is unknown or its checksum differs,
///   if a migration's SQL fails, or if the store cannot be read or written
///   at all (the underlying failure is kept as the source)
pub fn apply_migrations(conn: &mut Connection) -> Result<usize> {
    run_pending(conn).map_err(store_unreachable)
}

fn run_pending(conn: &mut Connection) -> Result<usize> {
    create_schema_version_table(conn)?;
    verify_recorded(conn)?;

    let mut applied = 0;
    for migration in get_migrations() {
        if apply_migration(conn, migration.id, migration.sql)? {
            applied += 1;
        }
    }

    Ok(applied)
}

/// List recorded migrations in application order
///
/// # Errors
/// * `Persistence` - If `schema_version` cannot be read
pub fn applied_migrations(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, applied_at, checksum FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                migration_id: row.get(0)?,
                applied_at: row.get(1)?,
                checksum: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    Ok(rows)
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Every recorded migration must be one we embed, with the same SQL
fn verify_recorded(conn: &Connection) -> Result<()> {
    let embedded = get_migrations();

    for recorded in applied_migrations(conn)? {
        let Some(migration) = embedded
            .iter()
            .find(|m| m.id == recorded.migration_id)
        else {
            return Err(unknown_migration(&recorded.migration_id));
        };

        let expected = compute_checksum(migration.sql);
        if recorded.checksum != expected {
            return Err(checksum_mismatch(
                &recorded.migration_id,
                &expected,
                &recorded.checksum,
            ));
        }
    }

    Ok(())
}

/// Apply a single migration if not already applied
///
/// Returns whether the migration ran.
fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<bool> {
    let already_applied = conn
        .query_row(
            "SELECT 1 FROM schema_version WHERE migration_id = ?",
            [migration_id],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?
        .is_some();

    if already_applied {
        return Ok(false);
    }

    let checksum = compute_checksum(sql);

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id, "applied migration");

    Ok(true)
}
