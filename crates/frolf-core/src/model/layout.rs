use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{push_unique, require_name, Course, Hole, Key};

/// One arrangement of holes on a course (e.g. short tees, long tees)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    id: i64,
    name: String,
    course: Key<Course>,
    pub(crate) holes: Vec<Key<Hole>>,
}

impl Layout {
    /// Create a new, unsaved layout on `course`
    ///
    /// # Errors
    /// * `InvalidName` - If `name` is empty or whitespace-only
    pub fn new(course: Key<Course>, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: UNSAVED_ID,
            name: require_name(EntityKind::Layout, name.into())?,
            course,
            holes: Vec::new(),
        })
    }

    /// Rebuild a stored layout from its row without validation
    pub fn from_stored(id: i64, course: Key<Course>, name: String) -> Self {
        Self {
            id,
            name,
            course,
            holes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning course
    pub fn course(&self) -> Key<Course> {
        self.course
    }

    /// Holes in insertion order
    pub fn holes(&self) -> &[Key<Hole>] {
        &self.holes
    }

    /// Change the layout name
    ///
    /// # Errors
    /// * `InvalidName` - If `name` is empty or whitespace-only
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        self.name = require_name(EntityKind::Layout, name.into())?;
        Ok(())
    }
}

impl Entity for Layout {
    const KIND: EntityKind = EntityKind::Layout;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for Layout {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.layouts
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.layouts
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        tracker.ensure_live(self.course)?;
        tracker.ensure_live_all(&self.holes)
    }

    fn link(key: Key<Self>, tracker: &mut ChangeTracker) {
        let Some(course) = tracker.layouts.get(key).map(|l| l.course) else {
            return;
        };
        if let Some(course) = tracker.courses.get_mut(course) {
            push_unique(&mut course.layouts, key);
        }
    }

    fn unlink(key: Key<Self>, tracker: &mut ChangeTracker) {
        let Some(course) = tracker.layouts.get(key).map(|l| l.course) else {
            return;
        };
        if let Some(course) = tracker.courses.get_mut(course) {
            course.layouts.retain(|k| *k != key);
        }
    }
}
