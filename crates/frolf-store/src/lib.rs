//! Frolf Store - SQLite persistence for the disc-golf score model
//!
//! Provides:
//! - Connection management and `ContextOptions` configuration
//! - Embedded, checksummed schema migrations (`ensure_schema`)
//! - A row layer (`SqliteRepo`) and hydration of rows into tracked entities
//! - `FrolfContext`, the single entry point for track/save/query

pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use config::{ContextOptions, StorageLocation};
pub use context::{FrolfContext, SaveSummary};
pub use errors::Result;
