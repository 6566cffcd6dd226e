//! Database connection management
//!
//! Opens and configures the single SQLite connection a context owns

use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::config::{ContextOptions, StorageLocation};
use crate::errors::{from_rusqlite, Result};

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open a private in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Open a named in-memory database shared within the process
pub fn open_shared_memory(name: &str) -> Result<Connection> {
    let uri = format!("file:{}?mode=memory&cache=shared", name);
    Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(from_rusqlite)
}

/// Open the connection described by `location`
pub fn open_location(location: &StorageLocation) -> Result<Connection> {
    match location {
        StorageLocation::Memory => open_in_memory(),
        StorageLocation::SharedMemory { name } => open_shared_memory(name),
        StorageLocation::File { path } => open(path),
    }
}

/// Configure a connection according to the context options
pub fn configure(conn: &Connection, options: &ContextOptions) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", options.foreign_keys)
        .map_err(from_rusqlite)?;

    // In-memory databases always report "memory" here
    if options.wal && options.location.is_durable() {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(from_rusqlite)?;
    }

    Ok(())
}
