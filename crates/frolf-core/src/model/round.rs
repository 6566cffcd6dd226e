use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{push_unique, Course, Key, Layout, Player, ScoreCard};

/// One playing session of a course layout by a group of players
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    id: i64,
    course: Key<Course>,
    layout: Key<Layout>,
    date: DateTime<Utc>,
    players: Vec<Key<Player>>,
    pub(crate) score_cards: Vec<Key<ScoreCard>>,
}

impl Round {
    /// Create a new, unsaved round owning `score_cards`
    ///
    /// Duplicate keys are collapsed, keeping first occurrence order.
    pub fn new(
        course: Key<Course>,
        layout: Key<Layout>,
        date: DateTime<Utc>,
        players: Vec<Key<Player>>,
        score_cards: Vec<Key<ScoreCard>>,
    ) -> Self {
        let mut round = Self {
            id: UNSAVED_ID,
            course,
            layout,
            date,
            players: Vec::with_capacity(players.len()),
            score_cards: Vec::with_capacity(score_cards.len()),
        };
        for player in players {
            round.add_player(player);
        }
        for card in score_cards {
            round.add_score_card(card);
        }
        round
    }

    /// Rebuild a stored round from its rows
    pub fn from_stored(
        id: i64,
        course: Key<Course>,
        layout: Key<Layout>,
        date: DateTime<Utc>,
        players: Vec<Key<Player>>,
        score_cards: Vec<Key<ScoreCard>>,
    ) -> Self {
        Self {
            id,
            course,
            layout,
            date,
            players,
            score_cards,
        }
    }

    pub fn course(&self) -> Key<Course> {
        self.course
    }

    pub fn layout(&self) -> Key<Layout> {
        self.layout
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn players(&self) -> &[Key<Player>] {
        &self.players
    }

    pub fn score_cards(&self) -> &[Key<ScoreCard>] {
        &self.score_cards
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
    }

    pub fn add_player(&mut self, player: Key<Player>) {
        push_unique(&mut self.players, player);
    }

    pub(crate) fn add_score_card(&mut self, score_card: Key<ScoreCard>) {
        push_unique(&mut self.score_cards, score_card);
    }
}

impl Entity for Round {
    const KIND: EntityKind = EntityKind::Round;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for Round {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.rounds
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.rounds
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        tracker.ensure_live(self.course)?;
        tracker.ensure_live(self.layout)?;
        tracker.ensure_same_course(EntityKind::Round, self.course, self.layout)?;
        tracker.ensure_live_all(&self.players)?;
        tracker.ensure_live_all(&self.score_cards)?;
        self.score_cards
            .iter()
            .try_for_each(|card| tracker.ensure_card_fits(self.course, *card, None))
    }
}
