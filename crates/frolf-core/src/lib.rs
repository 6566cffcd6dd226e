//! Frolf Core - disc-golf score-tracking domain model
//!
//! This crate provides the in-memory side of the persistence context:
//! - Entities (players, courses, layouts, holes, scorecards, hole scores, rounds)
//! - Typed arena keys used for every relation between entities
//! - The change tracker recording pending inserts, updates and deletes
//! - The canonical error facility and the structured logging facility
//!
//! Nothing in here touches storage; see `frolf-store` for that.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, FrolfError, Result};
pub use model::{
    Course, Entity, EntityKind, Hole, HoleScore, Key, Layout, Player, Round, ScoreCard,
    UNSAVED_ID,
};
pub use ops::{ChangeTracker, EntryState};
