use crate::errors::{FrolfError, Result};
use crate::ops::tracker::{Arena, ChangeTracker};

use super::entity::{sealed, Entity, EntityKind, UNSAVED_ID};
use super::{push_unique, Hole, Key, Player};

/// The score recorded on one hole
///
/// Attributable to several players at once for team or group formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleScore {
    id: i64,
    players: Vec<Key<Player>>,
    hole: Key<Hole>,
    score: i32,
}

impl HoleScore {
    /// Create a new, unsaved hole score
    ///
    /// Duplicate player keys are collapsed, keeping first occurrence order.
    ///
    /// # Errors
    /// * `EmptyPlayerSet` - If `players` is empty
    pub fn new(players: Vec<Key<Player>>, hole: Key<Hole>, score: i32) -> Result<Self> {
        if players.is_empty() {
            return Err(FrolfError::EmptyPlayerSet);
        }
        let mut unique = Vec::with_capacity(players.len());
        for player in players {
            push_unique(&mut unique, player);
        }
        Ok(Self {
            id: UNSAVED_ID,
            players: unique,
            hole,
            score,
        })
    }

    /// Rebuild a stored hole score from its rows without validation
    pub fn from_stored(id: i64, players: Vec<Key<Player>>, hole: Key<Hole>, score: i32) -> Self {
        Self {
            id,
            players,
            hole,
            score,
        }
    }

    pub fn players(&self) -> &[Key<Player>] {
        &self.players
    }

    pub fn hole(&self) -> Key<Hole> {
        self.hole
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    pub fn add_player(&mut self, player: Key<Player>) {
        push_unique(&mut self.players, player);
    }
}

impl Entity for HoleScore {
    const KIND: EntityKind = EntityKind::HoleScore;

    fn id(&self) -> i64 {
        self.id
    }
}

impl sealed::Tracked for HoleScore {
    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn arena(tracker: &ChangeTracker) -> &Arena<Self> {
        &tracker.hole_scores
    }

    fn arena_mut(tracker: &mut ChangeTracker) -> &mut Arena<Self> {
        &mut tracker.hole_scores
    }

    fn check_references(&self, tracker: &ChangeTracker) -> Result<()> {
        if self.players.is_empty() {
            return Err(FrolfError::EmptyPlayerSet);
        }
        tracker.ensure_live(self.hole)?;
        tracker.ensure_live_all(&self.players)
    }

    fn unlink(key: Key<Self>, tracker: &mut ChangeTracker) {
        for card in tracker.score_cards.values_mut() {
            card.hole_scores.retain(|k| *k != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_player_set_rejected() {
        let result = HoleScore::new(Vec::new(), Key::new(0), 3);
        assert_eq!(result, Err(FrolfError::EmptyPlayerSet));
    }

    #[test]
    fn test_duplicate_players_collapsed() {
        let a = Key::new(0);
        let b = Key::new(1);
        let score = HoleScore::new(vec![a, b, a], Key::new(0), 4).unwrap();

        assert_eq!(score.players(), &[a, b]);
        assert_eq!(score.score(), 4);
    }
}
