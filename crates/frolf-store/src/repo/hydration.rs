//! Hydration layer - loads stored rows into the change tracker
//!
//! Rows are materialized parents first so every foreign key resolves to a
//! key. Already tracked rows are left alone (identity map); collections are
//! rebuilt in row order.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use frolf_core::{
    ChangeTracker, Course, Entity, Hole, HoleScore, Key, Layout, Player, Round, ScoreCard,
};
use rusqlite::Connection;

use crate::errors::{dangling_reference, Result};
use crate::repo::sqlite_repo::PlayerLink;
use crate::repo::SqliteRepo;

/// Load every stored row into the tracker
///
/// Returns the number of entities that were not tracked before.
///
/// # Errors
/// * `Persistence` - If a query fails or a row references a missing row
pub fn load_all(conn: &Connection, tracker: &mut ChangeTracker) -> Result<usize> {
    let mut loaded = 0;

    for row in SqliteRepo::list_players(conn)? {
        loaded += attach(tracker, Player::from_stored(row.id, row.user_name));
    }

    for row in SqliteRepo::list_courses(conn)? {
        loaded += attach(tracker, Course::from_stored(row.id, row.name));
    }

    for row in SqliteRepo::list_layouts(conn)? {
        let course = resolve::<Course>(tracker, row.course_id)?;
        loaded += attach(tracker, Layout::from_stored(row.id, course, row.name));
    }

    for row in SqliteRepo::list_holes(conn)? {
        let course = resolve::<Course>(tracker, row.course_id)?;
        let layout = resolve::<Layout>(tracker, row.layout_id)?;
        loaded += attach(
            tracker,
            Hole::from_stored(row.id, row.number, course, layout, row.par),
        );
    }

    let mut hole_score_players = group_links(SqliteRepo::list_hole_score_players(conn)?);
    let mut card_scores: HashMap<i64, Vec<Key<HoleScore>>> = HashMap::new();
    for row in SqliteRepo::list_hole_scores(conn)? {
        let hole = resolve::<Hole>(tracker, row.hole_id)?;
        let players = resolve_all::<Player>(
            tracker,
            hole_score_players.remove(&row.id).unwrap_or_default(),
        )?;
        loaded += attach(
            tracker,
            HoleScore::from_stored(row.id, players, hole, row.score),
        );

        if let Some(card_id) = row.score_card_id {
            let key = resolve::<HoleScore>(tracker, row.id)?;
            card_scores.entry(card_id).or_default().push(key);
        }
    }

    let mut round_cards: HashMap<i64, Vec<Key<ScoreCard>>> = HashMap::new();
    for row in SqliteRepo::list_score_cards(conn)? {
        let course = resolve::<Course>(tracker, row.course_id)?;
        let layout = resolve::<Layout>(tracker, row.layout_id)?;
        let player = resolve::<Player>(tracker, row.player_id)?;
        let hole_scores = card_scores.remove(&row.id).unwrap_or_default();
        loaded += attach(
            tracker,
            ScoreCard::from_stored(row.id, course, layout, player, hole_scores),
        );

        if let Some(round_id) = row.round_id {
            let key = resolve::<ScoreCard>(tracker, row.id)?;
            round_cards.entry(round_id).or_default().push(key);
        }
    }

    let mut round_players = group_links(SqliteRepo::list_round_players(conn)?);
    for row in SqliteRepo::list_rounds(conn)? {
        let course = resolve::<Course>(tracker, row.course_id)?;
        let layout = resolve::<Layout>(tracker, row.layout_id)?;
        let date = Utc.timestamp_nanos(row.played_at);
        let players =
            resolve_all::<Player>(tracker, round_players.remove(&row.id).unwrap_or_default())?;
        let score_cards = round_cards.remove(&row.id).unwrap_or_default();
        loaded += attach(
            tracker,
            Round::from_stored(row.id, course, layout, date, players, score_cards),
        );
    }

    Ok(loaded)
}

/// Attach unless already tracked; 1 when newly attached
fn attach<T: Entity>(tracker: &mut ChangeTracker, entity: T) -> usize {
    if tracker.key_for::<T>(entity.id()).is_some() {
        return 0;
    }
    tracker.attach(entity);
    1
}

fn resolve<T: Entity>(tracker: &ChangeTracker, id: i64) -> Result<Key<T>> {
    tracker
        .key_for::<T>(id)
        .ok_or_else(|| dangling_reference(T::KIND, id))
}

fn resolve_all<T: Entity>(tracker: &ChangeTracker, ids: Vec<i64>) -> Result<Vec<Key<T>>> {
    ids.into_iter().map(|id| resolve(tracker, id)).collect()
}

/// Group join rows by owner, keeping position order
fn group_links(links: Vec<PlayerLink>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (owner_id, player_id) in links {
        grouped.entry(owner_id).or_default().push(player_id);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use frolf_core::EntryState;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_load_rebuilds_owned_collections() {
        let conn = setup();
        let course = SqliteRepo::insert_course(&conn, "Maple Hill").unwrap();
        let front = SqliteRepo::insert_layout(&conn, course, "Front").unwrap();
        let back = SqliteRepo::insert_layout(&conn, course, "Back").unwrap();
        SqliteRepo::insert_hole(&conn, course, front, 1, 3).unwrap();
        SqliteRepo::insert_hole(&conn, course, front, 2, 4).unwrap();

        let mut tracker = ChangeTracker::new();
        assert_eq!(load_all(&conn, &mut tracker).unwrap(), 5);

        let course_key = tracker.find::<Course>(course).unwrap();
        let front_key = tracker.find::<Layout>(front).unwrap();
        let back_key = tracker.find::<Layout>(back).unwrap();
        assert_eq!(
            tracker.get(course_key).unwrap().layouts(),
            &[front_key, back_key]
        );

        let pars: Vec<i32> = tracker
            .get(front_key)
            .unwrap()
            .holes()
            .iter()
            .map(|k| tracker.get(*k).unwrap().par())
            .collect();
        assert_eq!(pars, vec![3, 4]);
    }

    #[test]
    fn test_load_is_identity_mapped() {
        let conn = setup();
        let id = SqliteRepo::insert_player(&conn, "stored").unwrap();

        let mut tracker = ChangeTracker::new();
        load_all(&conn, &mut tracker).unwrap();
        let key = tracker.find::<Player>(id).unwrap();
        tracker.get_mut(key).unwrap().rename("edited").unwrap();

        assert_eq!(load_all(&conn, &mut tracker).unwrap(), 0);
        assert_eq!(tracker.get(key).unwrap().user_name(), "edited");
        assert_eq!(tracker.state(key), Some(EntryState::Modified));
    }

    #[test]
    fn test_blank_legacy_name_loads() {
        let conn = setup();
        let id = SqliteRepo::insert_player(&conn, "  ").unwrap();

        let mut tracker = ChangeTracker::new();
        load_all(&conn, &mut tracker).unwrap();

        let key = tracker.find::<Player>(id).unwrap();
        assert_eq!(tracker.get(key).unwrap().user_name(), "  ");
    }
}
