//! Error handling for frolf-store
//!
//! Wraps frolf-core ExError with store-specific helpers

use frolf_core::errors::{ExError, ExErrorKind};
use frolf_core::EntityKind;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Schema)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error (store built by different migration SQL)
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Schema)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create an unknown migration error (store is newer than this build)
pub fn unknown_migration(migration_id: &str) -> ExError {
    ExError::new(ExErrorKind::Schema)
        .with_op("migration")
        .with_message(format!(
            "Store records migration {} which this build does not know",
            migration_id
        ))
}

/// Report any failure while ensuring the schema as a schema error
///
/// Schema errors pass through unchanged; anything else (an unreadable or
/// read-only store) is wrapped with the original error as its source.
pub fn store_unreachable(err: ExError) -> ExError {
    if err.kind() == ExErrorKind::Schema {
        return err;
    }
    ExError::new(ExErrorKind::Schema)
        .with_op("migration")
        .with_message(format!("Schema store is unusable: {}", err.message()))
        .with_source(err)
}

/// Create an error for a row whose foreign key points at nothing
pub fn dangling_reference(kind: EntityKind, id: i64) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("hydrate")
        .with_entity_kind(kind)
        .with_entity_id(id)
        .with_message("Row references a missing entity")
}

/// Create an error for a key that has no stored row to point at
pub fn unresolved_reference(kind: EntityKind, index: usize) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("save")
        .with_entity_kind(kind)
        .with_entity_id(format!("key:{}", index))
        .with_message("Reference to an entity that was removed before it was saved")
}

/// Create an error for a round date outside the nanosecond range (1677-2262)
pub fn unstorable_date(index: usize, date: chrono::DateTime<chrono::Utc>) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("save")
        .with_entity_kind(EntityKind::Round)
        .with_entity_id(format!("key:{}", index))
        .with_message(format!("Round date {} cannot be stored", date.to_rfc3339()))
}

/// Create an error for invalid context options
pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("config")
        .with_message(reason)
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}
