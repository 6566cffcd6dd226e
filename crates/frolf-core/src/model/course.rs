use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{require_name, Key, Layout};

/// A disc-golf course
///
/// Owns its layouts; tracking a `Layout` appends it here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: i64,
    name: String,
    pub(crate) layouts: Vec<Key<Layout>>,
}

impl Course {
    /// Create a new, unsaved course with no layouts
    ///
    /// # Errors
    /// * `InvalidName` - If `name` is empty or whitespace-only
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: UNSAVED_ID,
            name: require_name(EntityKind::Course, name.into())?,
            layouts: Vec::new(),
        })
    }

    /// Rebuild a stored course from its row without validation
    ///
    /// Layouts are linked in as they are loaded.
    pub fn from_stored(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            layouts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layouts in insertion order
    pub fn layouts(&self) -> &[Key<Layout>] {
        &self.layouts
    }

    /// Change the course name
    ///
    /// # Errors
    /// * `InvalidName` - If `name` is empty or whitespace-only
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        self.name = require_name(EntityKind::Course, name.into())?;
        Ok(())
    }
}

impl Entity for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for Course {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.courses
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.courses
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        tracker.ensure_live_all(&self.layouts)
    }
}
