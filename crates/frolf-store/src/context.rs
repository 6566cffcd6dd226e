//! Persistence context
//!
//! `FrolfContext` owns one SQLite connection and one change tracker. Entities
//! are tracked in memory and written in a single transaction by `save`.
//! There is no separate discard: dropping the context drops every unsaved
//! change and releases the connection.

use std::path::Path;
use std::time::Instant;

use frolf_core::{
    log_op_end, log_op_error, log_op_start, ChangeTracker, Entity, EntryState, HoleScore, Key,
    Round, ScoreCard,
};
use rusqlite::Connection;

use crate::config::{ContextOptions, StorageLocation};
use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use crate::repo::{flush, hydration};

/// Row counts written by one `save`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SaveSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Unit of work over one relational store
pub struct FrolfContext {
    conn: Connection,
    tracker: ChangeTracker,
    options: ContextOptions,
}

impl FrolfContext {
    /// Open a context on the store described by `options`
    ///
    /// # Errors
    /// * `Persistence` - If the connection cannot be opened or configured
    pub fn open(options: &ContextOptions) -> Result<Self> {
        let conn = db::open_location(&options.location)?;
        db::configure(&conn, options)?;

        tracing::debug!(location = ?options.location, "opened context");

        Ok(Self {
            conn,
            tracker: ChangeTracker::new(),
            options: options.clone(),
        })
    }

    /// Open a context on a private in-memory store
    ///
    /// # Errors
    /// * `Persistence` - If the connection cannot be opened
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&ContextOptions::in_memory())
    }

    /// Open a context on a database file, creating it if needed
    ///
    /// # Errors
    /// * `Persistence` - If the file cannot be opened
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(&ContextOptions::file(path.as_ref()))
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn location(&self) -> &StorageLocation {
        &self.options.location
    }

    /// Create the schema if absent; a no-op when already current
    ///
    /// Returns the number of migrations applied.
    ///
    /// # Errors
    /// * `Schema` - If the store was built by other or newer migrations,
    ///   a migration fails against existing tables, or the store cannot be
    ///   read or written (e.g. the file is not a database)
    pub fn ensure_schema(&mut self) -> Result<usize> {
        let start = Instant::now();
        log_op_start!("ensure_schema");

        match apply_migrations(&mut self.conn) {
            Ok(applied) => {
                log_op_end!(
                    "ensure_schema",
                    duration_ms = start.elapsed().as_millis() as u64,
                    rows = applied
                );
                Ok(applied)
            }
            Err(e) => {
                log_op_error!(
                    "ensure_schema",
                    &e,
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    /// Register a new entity; it is inserted by the next `save`
    ///
    /// # Errors
    /// * `AlreadyTracked` - If the entity already has a stored identifier
    /// * `NotFound` / `Removed` - If a referenced key does not resolve
    /// * `Validation` - If the entity's layout belongs to another course,
    ///   or a hole score has no players
    pub fn track<T: Entity>(&mut self, entity: T) -> Result<Key<T>> {
        Ok(self.tracker.track(entity)?)
    }

    /// Resolve a key
    ///
    /// # Errors
    /// * `NotFound` - If the key was not issued by this context
    /// * `Removed` - If the entity was removed
    pub fn get<T: Entity>(&self, key: Key<T>) -> Result<&T> {
        Ok(self.tracker.get(key)?)
    }

    /// Resolve a key for mutation; the entity is updated by the next `save`
    ///
    /// # Errors
    /// * `NotFound` - If the key was not issued by this context
    /// * `Removed` - If the entity was removed
    pub fn get_mut<T: Entity>(&mut self, key: Key<T>) -> Result<&mut T> {
        Ok(self.tracker.get_mut(key)?)
    }

    /// Remove an entity; a stored one is deleted by the next `save`
    ///
    /// Nothing cascades. Removing an entity other rows still reference
    /// makes the next `save` fail.
    ///
    /// # Errors
    /// * `NotFound` - If the key was not issued by this context
    /// * `Removed` - If the entity was already removed
    pub fn remove<T: Entity>(&mut self, key: Key<T>) -> Result<()> {
        Ok(self.tracker.remove(key)?)
    }

    /// Add a scorecard to a round; the next `save` re-parents its row
    ///
    /// # Errors
    /// * `NotFound` / `Removed` - If either key does not resolve
    /// * `Validation` - If the scorecard is for another course or already
    ///   belongs to a different round
    pub fn add_score_card(&mut self, round: Key<Round>, card: Key<ScoreCard>) -> Result<()> {
        Ok(self.tracker.add_score_card(round, card)?)
    }

    /// Add a hole score to a scorecard; the next `save` re-parents its row
    ///
    /// # Errors
    /// * `NotFound` / `Removed` - If either key does not resolve
    /// * `Validation` - If the hole is on another course or the score
    ///   already belongs to a different scorecard
    pub fn add_hole_score(
        &mut self,
        card: Key<ScoreCard>,
        hole_score: Key<HoleScore>,
    ) -> Result<()> {
        Ok(self.tracker.add_hole_score(card, hole_score)?)
    }

    /// Lifecycle state of a key
    pub fn state<T: Entity>(&self, key: Key<T>) -> Option<EntryState> {
        self.tracker.state(key)
    }

    /// Write every pending change in one transaction
    ///
    /// On success identifiers are assigned and nothing is pending. On
    /// failure nothing is written and every pending change stays pending.
    ///
    /// # Errors
    /// * `Persistence` - If any write fails, including deletes of rows that
    ///   are still referenced
    pub fn save(&mut self) -> Result<SaveSummary> {
        let start = Instant::now();
        log_op_start!("save", rows = self.tracker.pending_count());

        match self.save_inner() {
            Ok(summary) => {
                log_op_end!(
                    "save",
                    duration_ms = start.elapsed().as_millis() as u64,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    deleted = summary.deleted
                );
                Ok(summary)
            }
            Err(e) => {
                log_op_error!(
                    "save",
                    &e,
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    fn save_inner(&mut self) -> Result<SaveSummary> {
        if !self.tracker.has_changes() {
            return Ok(SaveSummary::default());
        }

        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let flushed = flush(&tx, &self.tracker)?;
        tx.commit().map_err(from_rusqlite)?;

        flushed.accept(&mut self.tracker)?;

        Ok(SaveSummary {
            inserted: flushed.inserted(),
            updated: flushed.updated(),
            deleted: flushed.deleted(),
        })
    }

    /// All stored entities of a kind, in identifier order
    ///
    /// Rows not yet tracked are loaded first; tracked ones keep their
    /// in-memory state. Pending inserts are not included.
    ///
    /// # Errors
    /// * `Persistence` - If reading the store fails
    pub fn query<T: Entity>(&mut self) -> Result<Vec<T>> {
        Ok(self
            .query_keys::<T>()?
            .into_iter()
            .filter_map(|key| self.tracker.peek(key).cloned())
            .collect())
    }

    /// Keys of all stored entities of a kind, in identifier order
    ///
    /// # Errors
    /// * `Persistence` - If reading the store fails
    pub fn query_keys<T: Entity>(&mut self) -> Result<Vec<Key<T>>> {
        let start = Instant::now();
        log_op_start!("query", entity_kind = T::KIND.as_str());

        match hydration::load_all(&self.conn, &mut self.tracker) {
            Ok(loaded) => {
                let keys: Vec<Key<T>> = self
                    .tracker
                    .stored::<T>()
                    .into_iter()
                    .map(|(key, _)| key)
                    .collect();
                log_op_end!(
                    "query",
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_kind = T::KIND.as_str(),
                    rows = keys.len(),
                    loaded = loaded
                );
                Ok(keys)
            }
            Err(e) => {
                log_op_error!(
                    "query",
                    &e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    entity_kind = T::KIND.as_str()
                );
                Err(e)
            }
        }
    }

    /// Key of the stored entity with identifier `id`
    ///
    /// # Errors
    /// * `NotFound` - If no such entity is stored (or it was removed)
    /// * `Persistence` - If reading the store fails
    pub fn find<T: Entity>(&mut self, id: i64) -> Result<Key<T>> {
        if let Ok(key) = self.tracker.find::<T>(id) {
            return Ok(key);
        }
        hydration::load_all(&self.conn, &mut self.tracker)?;
        Ok(self.tracker.find::<T>(id)?)
    }

    /// Check if `save` has anything to write
    pub fn has_changes(&self) -> bool {
        self.tracker.has_changes()
    }

    /// Number of entities with a pending insert, update or delete
    pub fn pending_count(&self) -> usize {
        self.tracker.pending_count()
    }

    /// Read-only view of the change tracker
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Raw connection, for diagnostics and tests
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting failures that `Drop` would swallow
    ///
    /// Unsaved changes are discarded.
    ///
    /// # Errors
    /// * `Persistence` - If SQLite refuses to close the connection
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| from_rusqlite(e).with_op("close"))
    }
}
