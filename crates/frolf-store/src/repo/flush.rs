//! Flush layer - writes pending tracker changes as rows
//!
//! Runs inside the caller's transaction and never touches the tracker, so
//! a failed flush leaves every pending change in place. The returned
//! `Flushed` is accepted into the tracker only after commit.
//!
//! Order: inserts parents first, then updates, player sets and re-parenting
//! of owned children, then deletes children first.

use std::collections::HashMap;

use frolf_core::{
    ChangeTracker, Course, Entity, EntryState, Hole, HoleScore, Key, Layout, Player, Round,
    ScoreCard,
};
use rusqlite::Connection;

use crate::errors::{unresolved_reference, unstorable_date, Result};
use crate::repo::SqliteRepo;

/// Rows written for one entity kind
pub struct KindOutcome<T> {
    inserted: HashMap<Key<T>, i64>,
    updated: Vec<Key<T>>,
    deleted: Vec<Key<T>>,
}

impl<T> Default for KindOutcome<T> {
    fn default() -> Self {
        Self {
            inserted: HashMap::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T: Entity> KindOutcome<T> {
    fn accept(&self, tracker: &mut ChangeTracker) -> Result<()> {
        for (key, id) in &self.inserted {
            tracker.accept_insert(*key, *id)?;
        }
        for key in &self.updated {
            tracker.accept_update(*key);
        }
        for key in &self.deleted {
            tracker.accept_delete(*key);
        }
        Ok(())
    }
}

/// Everything one flush wrote, per kind
#[derive(Default)]
pub struct Flushed {
    players: KindOutcome<Player>,
    courses: KindOutcome<Course>,
    layouts: KindOutcome<Layout>,
    holes: KindOutcome<Hole>,
    rounds: KindOutcome<Round>,
    score_cards: KindOutcome<ScoreCard>,
    hole_scores: KindOutcome<HoleScore>,
}

impl Flushed {
    pub fn inserted(&self) -> usize {
        self.players.inserted.len()
            + self.courses.inserted.len()
            + self.layouts.inserted.len()
            + self.holes.inserted.len()
            + self.rounds.inserted.len()
            + self.score_cards.inserted.len()
            + self.hole_scores.inserted.len()
    }

    pub fn updated(&self) -> usize {
        self.players.updated.len()
            + self.courses.updated.len()
            + self.layouts.updated.len()
            + self.holes.updated.len()
            + self.rounds.updated.len()
            + self.score_cards.updated.len()
            + self.hole_scores.updated.len()
    }

    pub fn deleted(&self) -> usize {
        self.players.deleted.len()
            + self.courses.deleted.len()
            + self.layouts.deleted.len()
            + self.holes.deleted.len()
            + self.rounds.deleted.len()
            + self.score_cards.deleted.len()
            + self.hole_scores.deleted.len()
    }

    /// Assign ids and clear pending states; call after commit
    ///
    /// # Errors
    /// * `NotFound` - If a flushed key no longer belongs to the tracker
    pub fn accept(&self, tracker: &mut ChangeTracker) -> Result<()> {
        self.players.accept(tracker)?;
        self.courses.accept(tracker)?;
        self.layouts.accept(tracker)?;
        self.holes.accept(tracker)?;
        self.rounds.accept(tracker)?;
        self.score_cards.accept(tracker)?;
        self.hole_scores.accept(tracker)
    }
}

/// Write every pending change of `tracker` through `conn`
///
/// # Errors
/// * `Persistence` - If any statement fails (including foreign key
///   violations from deleting a row that is still referenced)
pub fn flush(conn: &Connection, tracker: &ChangeTracker) -> Result<Flushed> {
    let mut out = Flushed::default();

    insert_all(conn, tracker, &mut out)?;
    update_all(conn, tracker, &mut out)?;
    write_player_sets(conn, tracker, &out)?;
    reparent_children(conn, tracker, &out)?;

    delete_all(conn, tracker, &mut out.hole_scores)?;
    delete_all(conn, tracker, &mut out.score_cards)?;
    delete_all(conn, tracker, &mut out.rounds)?;
    delete_all(conn, tracker, &mut out.holes)?;
    delete_all(conn, tracker, &mut out.layouts)?;
    delete_all(conn, tracker, &mut out.courses)?;
    delete_all(conn, tracker, &mut out.players)?;

    Ok(out)
}

fn insert_all(conn: &Connection, tracker: &ChangeTracker, out: &mut Flushed) -> Result<()> {
    for key in keys_in::<Player>(tracker, &[EntryState::Added]) {
        let player = entity(tracker, key)?;
        let id = SqliteRepo::insert_player(conn, player.user_name())?;
        out.players.inserted.insert(key, id);
    }

    for key in keys_in::<Course>(tracker, &[EntryState::Added]) {
        let course = entity(tracker, key)?;
        let id = SqliteRepo::insert_course(conn, course.name())?;
        out.courses.inserted.insert(key, id);
    }

    for key in keys_in::<Layout>(tracker, &[EntryState::Added]) {
        let layout = entity(tracker, key)?;
        let course_id = id_of(tracker, &out.courses, layout.course())?;
        let id = SqliteRepo::insert_layout(conn, course_id, layout.name())?;
        out.layouts.inserted.insert(key, id);
    }

    for key in keys_in::<Hole>(tracker, &[EntryState::Added]) {
        let hole = entity(tracker, key)?;
        let course_id = id_of(tracker, &out.courses, hole.course())?;
        let layout_id = id_of(tracker, &out.layouts, hole.layout())?;
        let id = SqliteRepo::insert_hole(conn, course_id, layout_id, hole.number(), hole.par())?;
        out.holes.inserted.insert(key, id);
    }

    for key in keys_in::<Round>(tracker, &[EntryState::Added]) {
        let round = entity(tracker, key)?;
        let course_id = id_of(tracker, &out.courses, round.course())?;
        let layout_id = id_of(tracker, &out.layouts, round.layout())?;
        let id = SqliteRepo::insert_round(conn, course_id, layout_id, played_at(key, round)?)?;
        out.rounds.inserted.insert(key, id);
    }

    for key in keys_in::<ScoreCard>(tracker, &[EntryState::Added]) {
        let card = entity(tracker, key)?;
        let course_id = id_of(tracker, &out.courses, card.course())?;
        let layout_id = id_of(tracker, &out.layouts, card.layout())?;
        let player_id = id_of(tracker, &out.players, card.player())?;
        let round_id = tracker
            .round_of(key)
            .map(|round| id_of(tracker, &out.rounds, round))
            .transpose()?;
        let id =
            SqliteRepo::insert_score_card(conn, course_id, layout_id, player_id, round_id)?;
        out.score_cards.inserted.insert(key, id);
    }

    for key in keys_in::<HoleScore>(tracker, &[EntryState::Added]) {
        let hole_score = entity(tracker, key)?;
        let hole_id = id_of(tracker, &out.holes, hole_score.hole())?;
        let card_id = tracker
            .score_card_of(key)
            .map(|card| id_of(tracker, &out.score_cards, card))
            .transpose()?;
        let id = SqliteRepo::insert_hole_score(conn, hole_id, hole_score.score(), card_id)?;
        out.hole_scores.inserted.insert(key, id);
    }

    Ok(())
}

fn update_all(conn: &Connection, tracker: &ChangeTracker, out: &mut Flushed) -> Result<()> {
    let modified = &[EntryState::Modified];

    for key in keys_in::<Player>(tracker, modified) {
        let player = entity(tracker, key)?;
        SqliteRepo::update_player(conn, player.id(), player.user_name())?;
        out.players.updated.push(key);
    }

    for key in keys_in::<Course>(tracker, modified) {
        let course = entity(tracker, key)?;
        SqliteRepo::update_course(conn, course.id(), course.name())?;
        out.courses.updated.push(key);
    }

    for key in keys_in::<Layout>(tracker, modified) {
        let layout = entity(tracker, key)?;
        SqliteRepo::update_layout(conn, layout.id(), layout.name())?;
        out.layouts.updated.push(key);
    }

    for key in keys_in::<Hole>(tracker, modified) {
        let hole = entity(tracker, key)?;
        SqliteRepo::update_hole(conn, hole.id(), hole.number(), hole.par())?;
        out.holes.updated.push(key);
    }

    for key in keys_in::<Round>(tracker, modified) {
        let round = entity(tracker, key)?;
        SqliteRepo::update_round(conn, round.id(), played_at(key, round)?)?;
        out.rounds.updated.push(key);
    }

    // Score cards have no mutable columns; their hole scores are re-parented below
    out.score_cards.updated = keys_in::<ScoreCard>(tracker, modified);

    for key in keys_in::<HoleScore>(tracker, modified) {
        let hole_score = entity(tracker, key)?;
        SqliteRepo::update_hole_score(conn, hole_score.id(), hole_score.score())?;
        out.hole_scores.updated.push(key);
    }

    Ok(())
}

/// Round date as stored: nanoseconds since the Unix epoch, UTC
fn played_at(key: Key<Round>, round: &Round) -> Result<i64> {
    round
        .date()
        .timestamp_nanos_opt()
        .ok_or_else(|| unstorable_date(key.index(), round.date()))
}

fn write_player_sets(conn: &Connection, tracker: &ChangeTracker, out: &Flushed) -> Result<()> {
    let changed = &[EntryState::Added, EntryState::Modified];

    for key in keys_in::<HoleScore>(tracker, changed) {
        let hole_score = entity(tracker, key)?;
        let id = id_of(tracker, &out.hole_scores, key)?;
        let players = ids_of(tracker, &out.players, hole_score.players())?;
        SqliteRepo::replace_hole_score_players(conn, id, &players)?;
    }

    for key in keys_in::<Round>(tracker, changed) {
        let round = entity(tracker, key)?;
        let id = id_of(tracker, &out.rounds, key)?;
        let players = ids_of(tracker, &out.players, round.players())?;
        SqliteRepo::replace_round_players(conn, id, &players)?;
    }

    Ok(())
}

/// Point owned children that existed before their owner at it
fn reparent_children(conn: &Connection, tracker: &ChangeTracker, out: &Flushed) -> Result<()> {
    let changed = &[EntryState::Added, EntryState::Modified];

    for key in keys_in::<Round>(tracker, changed) {
        let round_id = id_of(tracker, &out.rounds, key)?;
        for card in entity(tracker, key)?.score_cards() {
            if out.score_cards.inserted.contains_key(card) {
                continue;
            }
            let card_id = id_of(tracker, &out.score_cards, *card)?;
            SqliteRepo::set_round_id(conn, card_id, round_id)?;
        }
    }

    for key in keys_in::<ScoreCard>(tracker, changed) {
        let card_id = id_of(tracker, &out.score_cards, key)?;
        for hole_score in entity(tracker, key)?.hole_scores() {
            if out.hole_scores.inserted.contains_key(hole_score) {
                continue;
            }
            let hole_score_id = id_of(tracker, &out.hole_scores, *hole_score)?;
            SqliteRepo::set_score_card_id(conn, hole_score_id, card_id)?;
        }
    }

    Ok(())
}

fn delete_all<T: Entity>(
    conn: &Connection,
    tracker: &ChangeTracker,
    outcome: &mut KindOutcome<T>,
) -> Result<()> {
    for key in keys_in::<T>(tracker, &[EntryState::Deleted]) {
        let id = entity(tracker, key)?.id();
        SqliteRepo::delete_row(conn, T::KIND, id)?;
        outcome.deleted.push(key);
    }
    Ok(())
}

fn keys_in<T: Entity>(tracker: &ChangeTracker, states: &[EntryState]) -> Vec<Key<T>> {
    tracker
        .entries::<T>()
        .filter(|(_, _, state)| states.contains(state))
        .map(|(key, _, _)| key)
        .collect()
}

fn entity<T: Entity>(tracker: &ChangeTracker, key: Key<T>) -> Result<&T> {
    tracker
        .peek(key)
        .ok_or_else(|| unresolved_reference(T::KIND, key.index()))
}

/// Stored id of `key`, or the id this flush just assigned to it
fn id_of<T: Entity>(
    tracker: &ChangeTracker,
    outcome: &KindOutcome<T>,
    key: Key<T>,
) -> Result<i64> {
    let target = entity(tracker, key)?;
    if target.is_saved() {
        return Ok(target.id());
    }
    outcome
        .inserted
        .get(&key)
        .copied()
        .ok_or_else(|| unresolved_reference(T::KIND, key.index()))
}

fn ids_of<T: Entity>(
    tracker: &ChangeTracker,
    outcome: &KindOutcome<T>,
    keys: &[Key<T>],
) -> Result<Vec<i64>> {
    keys.iter().map(|key| id_of(tracker, outcome, *key)).collect()
}
