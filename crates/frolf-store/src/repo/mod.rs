//! Repository layer for persisting the score model to SQLite
//!
//! - `sqlite_repo`: row-level reads and writes per table
//! - `hydration`: rows into tracked entities
//! - `flush`: pending tracker changes into rows

pub mod flush;
pub mod hydration;
pub mod sqlite_repo;

pub use flush::{flush, Flushed};
pub use sqlite_repo::SqliteRepo;
