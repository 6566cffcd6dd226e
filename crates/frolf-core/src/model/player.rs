use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::require_name;

/// A registered disc golfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: i64,
    user_name: String,
}

impl Player {
    /// Create a new, unsaved player
    ///
    /// # Errors
    /// * `InvalidName` - If `user_name` is empty or whitespace-only
    pub fn new(user_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: UNSAVED_ID,
            user_name: require_name(EntityKind::Player, user_name.into())?,
        })
    }

    /// Rebuild a stored player from its row without validation
    pub fn from_stored(id: i64, user_name: String) -> Self {
        Self { id, user_name }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Change the user name
    ///
    /// # Errors
    /// * `InvalidName` - If `user_name` is empty or whitespace-only
    pub fn rename(&mut self, user_name: impl Into<String>) -> Result<()> {
        self.user_name = require_name(EntityKind::Player, user_name.into())?;
        Ok(())
    }
}

impl Entity for Player {
    const KIND: EntityKind = EntityKind::Player;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for Player {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.players
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.players
    }

    fn check_references(&self, _tracker: &ChangeTracker) -> Result<()> {
        Ok(())
    }
}
