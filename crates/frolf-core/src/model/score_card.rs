use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{push_unique, Course, HoleScore, Key, Layout, Player};

/// One player's hole-by-hole scores for a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    id: i64,
    course: Key<Course>,
    layout: Key<Layout>,
    player: Key<Player>,
    pub(crate) hole_scores: Vec<Key<HoleScore>>,
}

impl ScoreCard {
    /// Create a new, unsaved scorecard owning `hole_scores`
    pub fn new(
        course: Key<Course>,
        layout: Key<Layout>,
        player: Key<Player>,
        hole_scores: Vec<Key<HoleScore>>,
    ) -> Self {
        let mut owned = Vec::with_capacity(hole_scores.len());
        for hole_score in hole_scores {
            push_unique(&mut owned, hole_score);
        }
        Self {
            id: UNSAVED_ID,
            course,
            layout,
            player,
            hole_scores: owned,
        }
    }

    /// Rebuild a stored scorecard from its rows
    pub fn from_stored(
        id: i64,
        course: Key<Course>,
        layout: Key<Layout>,
        player: Key<Player>,
        hole_scores: Vec<Key<HoleScore>>,
    ) -> Self {
        Self {
            id,
            course,
            layout,
            player,
            hole_scores,
        }
    }

    pub fn course(&self) -> Key<Course> {
        self.course
    }

    pub fn layout(&self) -> Key<Layout> {
        self.layout
    }

    pub fn player(&self) -> Key<Player> {
        self.player
    }

    /// Hole scores in insertion order
    pub fn hole_scores(&self) -> &[Key<HoleScore>] {
        &self.hole_scores
    }

    pub(crate) fn add_hole_score(&mut self, hole_score: Key<HoleScore>) {
        push_unique(&mut self.hole_scores, hole_score);
    }
}

impl Entity for ScoreCard {
    const KIND: EntityKind = EntityKind::ScoreCard;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for ScoreCard {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.score_cards
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.score_cards
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        tracker.ensure_live(self.course)?;
        tracker.ensure_live(self.layout)?;
        tracker.ensure_live(self.player)?;
        tracker.ensure_same_course(EntityKind::ScoreCard, self.course, self.layout)?;
        tracker.ensure_live_all(&self.hole_scores)?;
        self.hole_scores
            .iter()
            .try_for_each(|score| tracker.ensure_score_fits(self.course, *score, None))
    }

    fn unlink(key: Key<Self>, tracker: &mut ChangeTracker) {
        for round in tracker.rounds.values_mut() {
            round.score_cards.retain(|k| *k != key);
        }
    }
}
