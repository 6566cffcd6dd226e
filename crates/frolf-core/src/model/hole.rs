use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{push_unique, Course, Key, Layout};

/// A single hole of a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole {
    id: i64,
    number: i32,
    par: i32,
    course: Key<Course>,
    layout: Key<Layout>,
}

impl Hole {
    /// Create a new, unsaved hole
    ///
    /// The layout must belong to `course`; this is checked when the hole is tracked.
    pub fn new(number: i32, course: Key<Course>, layout: Key<Layout>, par: i32) -> Self {
        Self {
            id: UNSAVED_ID,
            number,
            par,
            course,
            layout,
        }
    }

    /// Rebuild a stored hole from its row
    pub fn from_stored(
        id: i64,
        number: i32,
        course: Key<Course>,
        layout: Key<Layout>,
        par: i32,
    ) -> Self {
        Self {
            id,
            number,
            par,
            course,
            layout,
        }
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn par(&self) -> i32 {
        self.par
    }

    pub fn course(&self) -> Key<Course> {
        self.course
    }

    pub fn layout(&self) -> Key<Layout> {
        self.layout
    }

    pub fn set_par(&mut self, par: i32) {
        self.par = par;
    }
}

impl Entity for Hole {
    const KIND: EntityKind = EntityKind::Hole;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for Hole {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.holes
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.holes
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        tracker.ensure_live(self.course)?;
        tracker.ensure_live(self.layout)?;
        tracker.ensure_same_course(EntityKind::Hole, self.course, self.layout)
    }

    fn link(key: Key<Self>, tracker: &mut ChangeTracker) {
        let Some(layout) = tracker.holes.get(key).map(|h| h.layout) else {
            return;
        };
        if let Some(layout) = tracker.layouts.get_mut(layout) {
            push_unique(&mut layout.holes, key);
        }
    }

    fn unlink(key: Key<Self>, tracker: &mut ChangeTracker) {
        let Some(layout) = tracker.holes.get(key).map(|h| h.layout) else {
            return;
        };
        if let Some(layout) = tracker.layouts.get_mut(layout) {
            layout.holes.retain(|k| *k != key);
        }
    }
}
