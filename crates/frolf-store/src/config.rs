//! Context configuration
//!
//! Options can be built in code or read from TOML:
//!
//! ```
//! use frolf_store::{ContextOptions, StorageLocation};
//!
//! let options = ContextOptions::from_toml_str(
//!     r#"
//!     wal = false
//!
//!     [location]
//!     kind = "file"
//!     path = "scores.db"
//!     "#,
//! )
//! .unwrap();
//! assert!(matches!(options.location, StorageLocation::File { .. }));
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{config_error, Result};

/// Where the relational store lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageLocation {
    /// Private in-memory database, gone when the context closes
    #[default]
    Memory,
    /// Named in-memory database shared by every connection in the process
    ///
    /// Survives as long as at least one connection to it stays open.
    SharedMemory { name: String },
    /// Durable database file
    File { path: PathBuf },
}

impl StorageLocation {
    /// Check if data outlives the process
    pub fn is_durable(&self) -> bool {
        matches!(self, StorageLocation::File { .. })
    }
}

/// Options for opening a `FrolfContext`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    pub location: StorageLocation,
    /// Enforce foreign keys on the connection
    pub foreign_keys: bool,
    /// Use write-ahead logging (file-backed stores only)
    pub wal: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            location: StorageLocation::Memory,
            foreign_keys: true,
            wal: true,
        }
    }
}

impl ContextOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn shared_memory(name: impl Into<String>) -> Self {
        Self {
            location: StorageLocation::SharedMemory { name: name.into() },
            ..Self::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StorageLocation::File { path: path.into() },
            ..Self::default()
        }
    }

    /// Parse options from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// * `InvalidConfig` - If the text is not valid TOML for these options,
    ///   or a shared memory name is blank
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text).map_err(|e| config_error(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if let StorageLocation::SharedMemory { name } = &self.location {
            if name.trim().is_empty() {
                return Err(config_error("Shared memory name cannot be empty"));
            }
        }
        Ok(())
    }
}
