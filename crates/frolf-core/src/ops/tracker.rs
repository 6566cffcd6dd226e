use std::collections::HashMap;

use crate::errors::{FrolfError, Result};
use crate::model::{
    Course, Entity, EntityKind, Hole, HoleScore, Key, Layout, Player, Round, ScoreCard,
};

/// Lifecycle state of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Constructed in memory, waiting for its first insert
    Added,
    /// Matches storage as of the last save or load
    Unchanged,
    /// Stored, with pending field or collection changes
    Modified,
    /// Stored, waiting for its row to be deleted
    Deleted,
    /// No longer tracked; keys to it are dangling
    Detached,
}

impl EntryState {
    /// Check if the next save has work to do for this entry
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            EntryState::Added | EntryState::Modified | EntryState::Deleted
        )
    }

    fn is_live(&self) -> bool {
        matches!(
            self,
            EntryState::Added | EntryState::Unchanged | EntryState::Modified
        )
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    entity: T,
    state: EntryState,
}

/// Arena of one entity kind, plus its stored-id index
#[derive(Debug, Clone)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    by_id: HashMap<i64, usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T> Arena<T> {
    /// Number of entries that are not detached
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state != EntryState::Detached)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw access regardless of pending deletion
    pub(crate) fn get(&self, key: Key<T>) -> Option<&T> {
        self.entries
            .get(key.index())
            .filter(|e| e.state != EntryState::Detached)
            .map(|e| &e.entity)
    }

    /// Raw mutable access; does not change the entry state
    pub(crate) fn get_mut(&mut self, key: Key<T>) -> Option<&mut T> {
        self.entries
            .get_mut(key.index())
            .filter(|e| e.state != EntryState::Detached)
            .map(|e| &mut e.entity)
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries
            .iter_mut()
            .filter(|e| e.state != EntryState::Detached)
            .map(|e| &mut e.entity)
    }

    fn push(&mut self, entity: T, state: EntryState) -> Key<T> {
        self.entries.push(Entry { entity, state });
        Key::new(self.entries.len() - 1)
    }

    fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.state.is_pending()).count()
    }
}

/// In-memory change set of a persistence context
///
/// Holds one arena per entity kind. Entities enter either through `track`
/// (new, pending insert) or `attach` (materialized from storage). Not
/// thread-safe; designed for a single owner.
///
/// Slots are never reused: a removed or deleted entity stays in its arena
/// as `Detached`, so an old key keeps reporting `EntityRemoved` instead of
/// silently resolving to a newer entity. Memory therefore grows with every
/// entity a tracker has seen; use one context per unit of work rather than
/// one for the life of a process.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    pub(crate) players: Arena<Player>,
    pub(crate) courses: Arena<Course>,
    pub(crate) layouts: Arena<Layout>,
    pub(crate) holes: Arena<Hole>,
    pub(crate) score_cards: Arena<ScoreCard>,
    pub(crate) hole_scores: Arena<HoleScore>,
    pub(crate) rounds: Arena<Round>,
}

impl ChangeTracker {
    /// Create a new empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly constructed entity as pending insert
    ///
    /// Links the entity into its owner's collection (layouts into their
    /// course, holes into their layout).
    ///
    /// # Errors
    /// * `AlreadyTracked` - If the entity already carries a stored identifier
    /// * `KeyNotFound` / `EntityRemoved` - If a referenced key does not resolve
    /// * `CourseMismatch` - If the referenced layout, or an owned child,
    ///   belongs to another course
    /// * `AlreadyOwned` - If an owned child is already listed elsewhere
    /// * `EmptyPlayerSet` - If a hole score has no players
    pub fn track<T: Entity>(&mut self, entity: T) -> Result<Key<T>> {
        if entity.is_saved() {
            return Err(FrolfError::AlreadyTracked {
                kind: T::KIND,
                id: entity.id(),
            });
        }

        entity.check_references(self)?;

        let key = T::arena_mut(self).push(entity, EntryState::Added);
        T::link(key, self);

        Ok(key)
    }

    /// Start tracking an entity materialized from storage
    ///
    /// Identity-mapped: if an entity with the same stored id is already
    /// tracked, the tracked one wins and its key is returned.
    pub fn attach<T: Entity>(&mut self, entity: T) -> Key<T> {
        let id = entity.id();
        if let Some(key) = self.key_for::<T>(id) {
            return key;
        }

        let arena = T::arena_mut(self);
        let key = arena.push(entity, EntryState::Unchanged);
        arena.by_id.insert(id, key.index());
        T::link(key, self);

        key
    }

    /// Resolve a key to a live entity
    ///
    /// # Errors
    /// * `KeyNotFound` - If the key was not issued by this tracker
    /// * `EntityRemoved` - If the entity was removed
    pub fn get<T: Entity>(&self, key: Key<T>) -> Result<&T> {
        let entry = self.entry(key)?;
        Ok(&entry.entity)
    }

    /// Resolve a key for mutation, marking a stored entity as modified
    ///
    /// # Errors
    /// * `KeyNotFound` - If the key was not issued by this tracker
    /// * `EntityRemoved` - If the entity was removed
    pub fn get_mut<T: Entity>(&mut self, key: Key<T>) -> Result<&mut T> {
        self.entry(key)?;

        let entry = &mut T::arena_mut(self).entries[key.index()];
        if entry.state == EntryState::Unchanged {
            entry.state = EntryState::Modified;
        }

        Ok(&mut entry.entity)
    }

    /// Mark an entity for deletion and unlink it from its owner
    ///
    /// An entity that was never saved is detached right away.
    ///
    /// # Errors
    /// * `KeyNotFound` - If the key was not issued by this tracker
    /// * `EntityRemoved` - If the entity was already removed
    pub fn remove<T: Entity>(&mut self, key: Key<T>) -> Result<()> {
        let was_added = self.entry(key)?.state == EntryState::Added;

        T::unlink(key, self);

        let entry = &mut T::arena_mut(self).entries[key.index()];
        entry.state = if was_added {
            EntryState::Detached
        } else {
            EntryState::Deleted
        };

        Ok(())
    }

    /// Add a scorecard to a round's owned collection
    ///
    /// Marks a stored round as modified; the next save re-parents the card.
    ///
    /// # Errors
    /// * `KeyNotFound` / `EntityRemoved` - If either key does not resolve
    /// * `CourseMismatch` - If the scorecard is for another course
    /// * `AlreadyOwned` - If a different round already lists the scorecard
    pub fn add_score_card(&mut self, round: Key<Round>, card: Key<ScoreCard>) -> Result<()> {
        let course = self.get(round)?.course();
        self.ensure_card_fits(course, card, Some(round))?;
        self.get_mut(round)?.add_score_card(card);
        Ok(())
    }

    /// Add a hole score to a scorecard's owned collection
    ///
    /// # Errors
    /// * `KeyNotFound` / `EntityRemoved` - If either key does not resolve
    /// * `CourseMismatch` - If the hole is on another course
    /// * `AlreadyOwned` - If a different scorecard already lists the score
    pub fn add_hole_score(
        &mut self,
        card: Key<ScoreCard>,
        hole_score: Key<HoleScore>,
    ) -> Result<()> {
        let course = self.get(card)?.course();
        self.ensure_score_fits(course, hole_score, Some(card))?;
        self.get_mut(card)?.add_hole_score(hole_score);
        Ok(())
    }

    /// Current state of a key, if it was issued by this tracker
    pub fn state<T: Entity>(&self, key: Key<T>) -> Option<EntryState> {
        T::arena(self).entries.get(key.index()).map(|e| e.state)
    }

    /// Entity behind a key, including one pending deletion
    pub fn peek<T: Entity>(&self, key: Key<T>) -> Option<&T> {
        T::arena(self).get(key)
    }

    /// Key of the tracked entity with the given stored id
    pub fn key_for<T: Entity>(&self, id: i64) -> Option<Key<T>> {
        T::arena(self).by_id.get(&id).map(|index| Key::new(*index))
    }

    /// Key of the live stored entity with the given id
    ///
    /// # Errors
    /// * `EntityNotFound` - If no live entity with that id is tracked
    pub fn find<T: Entity>(&self, id: i64) -> Result<Key<T>> {
        self.key_for::<T>(id)
            .filter(|key| self.state(*key).is_some_and(|s| s.is_live()))
            .ok_or(FrolfError::EntityNotFound { kind: T::KIND, id })
    }

    /// All tracked entries of a kind, excluding detached ones
    pub fn entries<'a, T: Entity + 'a>(
        &'a self,
    ) -> impl Iterator<Item = (Key<T>, &'a T, EntryState)> + 'a {
        T::arena(self)
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state != EntryState::Detached)
            .map(|(index, e)| (Key::new(index), &e.entity, e.state))
    }

    /// Stored, live entities of a kind in identifier order
    pub fn stored<T: Entity>(&self) -> Vec<(Key<T>, &T)> {
        let mut stored: Vec<(Key<T>, &T)> = self
            .entries::<T>()
            .filter(|(_, _, state)| matches!(state, EntryState::Unchanged | EntryState::Modified))
            .map(|(key, entity, _)| (key, entity))
            .collect();
        stored.sort_by_key(|(_, entity)| entity.id());
        stored
    }

    /// Number of entries with work pending for the next save
    pub fn pending_count(&self) -> usize {
        self.players.pending()
            + self.courses.pending()
            + self.layouts.pending()
            + self.holes.pending()
            + self.score_cards.pending()
            + self.hole_scores.pending()
            + self.rounds.pending()
    }

    /// Check if the next save has anything to write
    pub fn has_changes(&self) -> bool {
        self.pending_count() > 0
    }

    /// Record the identifier storage assigned to an inserted entity
    ///
    /// Identifiers are immutable: an entity that already has one keeps it.
    ///
    /// # Errors
    /// * `KeyNotFound` - If the key was not issued by this tracker
    pub fn accept_insert<T: Entity>(&mut self, key: Key<T>, id: i64) -> Result<()> {
        let arena = T::arena_mut(self);
        let entry = arena
            .entries
            .get_mut(key.index())
            .ok_or(FrolfError::KeyNotFound {
                kind: T::KIND,
                index: key.index(),
            })?;

        if !entry.entity.is_saved() {
            entry.entity.assign_id(id);
        }
        entry.state = EntryState::Unchanged;
        let stored_id = entry.entity.id();
        arena.by_id.insert(stored_id, key.index());

        Ok(())
    }

    /// Mark a flushed update as matching storage
    pub fn accept_update<T: Entity>(&mut self, key: Key<T>) {
        if let Some(entry) = T::arena_mut(self).entries.get_mut(key.index()) {
            entry.state = EntryState::Unchanged;
        }
    }

    /// Detach an entity whose row was deleted
    pub fn accept_delete<T: Entity>(&mut self, key: Key<T>) {
        let arena = T::arena_mut(self);
        if let Some(entry) = arena.entries.get_mut(key.index()) {
            entry.state = EntryState::Detached;
            let id = entry.entity.id();
            arena.by_id.remove(&id);
        }
    }

    /// Live round that lists the given scorecard
    pub fn round_of(&self, card: Key<ScoreCard>) -> Option<Key<Round>> {
        self.entries::<Round>()
            .filter(|(_, _, state)| state.is_live())
            .find(|(_, round, _)| round.score_cards().contains(&card))
            .map(|(key, _, _)| key)
    }

    /// Live scorecard that lists the given hole score
    pub fn score_card_of(&self, hole_score: Key<HoleScore>) -> Option<Key<ScoreCard>> {
        self.entries::<ScoreCard>()
            .filter(|(_, _, state)| state.is_live())
            .find(|(_, card, _)| card.hole_scores().contains(&hole_score))
            .map(|(key, _, _)| key)
    }

    pub(crate) fn ensure_live<T: Entity>(&self, key: Key<T>) -> Result<()> {
        self.entry(key).map(|_| ())
    }

    pub(crate) fn ensure_live_all<T: Entity>(&self, keys: &[Key<T>]) -> Result<()> {
        keys.iter().try_for_each(|key| self.ensure_live(*key))
    }

    /// The layout must belong to `course`
    pub(crate) fn ensure_same_course(
        &self,
        kind: EntityKind,
        course: Key<Course>,
        layout: Key<Layout>,
    ) -> Result<()> {
        let layout_course = self.get(layout)?.course();
        if layout_course != course {
            return Err(FrolfError::CourseMismatch {
                kind,
                expected: self.label(course),
                actual: self.label(layout_course),
            });
        }
        Ok(())
    }

    /// A scorecard must share the round's course and have no other round
    pub(crate) fn ensure_card_fits(
        &self,
        course: Key<Course>,
        card: Key<ScoreCard>,
        owner: Option<Key<Round>>,
    ) -> Result<()> {
        let card_course = self.get(card)?.course();
        if card_course != course {
            return Err(FrolfError::CourseMismatch {
                kind: EntityKind::ScoreCard,
                expected: self.label(course),
                actual: self.label(card_course),
            });
        }
        match self.round_of(card) {
            Some(other) if Some(other) != owner => Err(FrolfError::AlreadyOwned {
                kind: EntityKind::ScoreCard,
                index: card.index(),
                owner: EntityKind::Round,
            }),
            _ => Ok(()),
        }
    }

    /// A hole score must be on a hole of the card's course and have no other card
    pub(crate) fn ensure_score_fits(
        &self,
        course: Key<Course>,
        hole_score: Key<HoleScore>,
        owner: Option<Key<ScoreCard>>,
    ) -> Result<()> {
        let hole = self.get(hole_score)?.hole();
        let hole_course = self.get(hole)?.course();
        if hole_course != course {
            return Err(FrolfError::CourseMismatch {
                kind: EntityKind::HoleScore,
                expected: self.label(course),
                actual: self.label(hole_course),
            });
        }
        match self.score_card_of(hole_score) {
            Some(other) if Some(other) != owner => Err(FrolfError::AlreadyOwned {
                kind: EntityKind::HoleScore,
                index: hole_score.index(),
                owner: EntityKind::ScoreCard,
            }),
            _ => Ok(()),
        }
    }

    fn entry<T: Entity>(&self, key: Key<T>) -> Result<&Entry<T>> {
        let entry = T::arena(self)
            .entries
            .get(key.index())
            .ok_or(FrolfError::KeyNotFound {
                kind: T::KIND,
                index: key.index(),
            })?;

        if !entry.state.is_live() {
            return Err(FrolfError::EntityRemoved {
                kind: T::KIND,
                index: key.index(),
            });
        }

        Ok(entry)
    }

    /// Human-readable reference: stored id when there is one
    fn label<T: Entity>(&self, key: Key<T>) -> String {
        match T::arena(self).get(key) {
            Some(entity) if entity.is_saved() => entity.id().to_string(),
            _ => format!("key:{}", key.index()),
        }
    }
}
