use std::fmt;

use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::Key;

/// Identifier carried by every entity until storage assigns a real one
pub const UNSAVED_ID: i64 = 0;

/// The kinds of entity the context persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Course,
    Layout,
    Hole,
    ScoreCard,
    HoleScore,
    Round,
}

impl EntityKind {
    /// Stable lowercase name used in logs and error context
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Course => "course",
            EntityKind::Layout => "layout",
            EntityKind::Hole => "hole",
            EntityKind::ScoreCard => "score_card",
            EntityKind::HoleScore => "hole_score",
            EntityKind::Round => "round",
        }
    }

    /// Name of the table backing this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Player => "players",
            EntityKind::Course => "courses",
            EntityKind::Layout => "layouts",
            EntityKind::Hole => "holes",
            EntityKind::ScoreCard => "score_cards",
            EntityKind::HoleScore => "hole_scores",
            EntityKind::Round => "rounds",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) mod sealed {
    use super::*;

    /// Tracker plumbing kept out of the public surface
    pub trait Tracked: Sized {
        fn assign_id(&mut self, id: i64);

        fn arena(tracker: &ChangeTracker) -> &Arena<Self>;

        fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self>;

        /// Every key held must resolve to a live entity
        fn check_references(&self, tracker: &ChangeTracker) -> Result<()>;

        /// Register the entity in its owner's collection
        fn link(_key: Key<Self>, _tracker: &mut ChangeTracker) {}

        /// Drop the entity from its owner's collection
        fn unlink(_key: Key<Self>, _tracker: &mut ChangeTracker) {}
    }
}

/// A persisted record with a storage-assigned identifier
pub trait Entity: sealed::Tracked + Clone + fmt::Debug {
    const KIND: EntityKind;

    /// Storage identifier, `UNSAVED_ID` until first saved
    fn id(&self) -> i64;

    /// Check if storage has assigned an identifier
    fn is_saved(&self) -> bool {
        self.id() != UNSAVED_ID
    }
}
