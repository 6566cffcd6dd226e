// Integration tests for the persistence context lifecycle
// Covers: identifier assignment, updates, removal without cascade,
// all-or-nothing saves, NotFound versus empty results, and track-time checks

use chrono::{TimeZone, Utc};
use frolf_core::{
    Course, Entity, EntryState, ExErrorKind, Hole, HoleScore, Layout, Player, Round, ScoreCard,
    UNSAVED_ID,
};
use frolf_store::repo::SqliteRepo;
use frolf_store::{ContextOptions, FrolfContext};

fn setup_context() -> FrolfContext {
    let mut ctx = FrolfContext::open_in_memory().unwrap();
    ctx.ensure_schema().unwrap();
    ctx
}

#[test]
fn test_ids_assigned_on_save() {
    // Given: Three tracked players
    let mut ctx = setup_context();
    let keys: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| ctx.track(Player::new(name).unwrap()).unwrap())
        .collect();

    // Then: None has an identifier yet
    for key in &keys {
        assert_eq!(ctx.get(*key).unwrap().id(), UNSAVED_ID);
        assert_eq!(ctx.state(*key), Some(EntryState::Added));
    }

    // When: The context is saved
    ctx.save().unwrap();

    // Then: Each got a distinct positive identifier
    let mut ids: Vec<i64> = keys.iter().map(|k| ctx.get(*k).unwrap().id()).collect();
    assert!(ids.iter().all(|id| *id > 0));
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert!(!ctx.has_changes());
}

#[test]
fn test_update_persists() {
    // Given: A saved player
    let mut ctx = setup_context();
    let key = ctx.track(Player::new("old name").unwrap()).unwrap();
    ctx.save().unwrap();
    let id = ctx.get(key).unwrap().id();

    // When: The player is renamed and saved
    ctx.get_mut(key).unwrap().rename("new name").unwrap();
    assert_eq!(ctx.state(key), Some(EntryState::Modified));
    let summary = ctx.save().unwrap();

    // Then: The row carries the new name and the id did not change
    assert_eq!(summary.updated, 1);
    assert_eq!(ctx.get(key).unwrap().id(), id);
    let rows = SqliteRepo::list_players(ctx.connection()).unwrap();
    assert_eq!(rows[0].user_name, "new name");
}

#[test]
fn test_failed_save_rolls_back_and_keeps_pending() {
    // Given: A stored player still referenced by a stored hole score
    let mut ctx = setup_context();
    let player = ctx.track(Player::new("referenced").unwrap()).unwrap();
    let course = ctx.track(Course::new("Maple Hill").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "Gold").unwrap()).unwrap();
    let hole = ctx.track(Hole::new(1, course, layout, 3)).unwrap();
    let score = ctx
        .track(HoleScore::new(vec![player], hole, 3).unwrap())
        .unwrap();
    ctx.save().unwrap();

    // When: The player is removed alongside an unrelated new course
    ctx.remove(player).unwrap();
    let extra = ctx.track(Course::new("Extra").unwrap()).unwrap();
    let err = ctx.save().unwrap_err();

    // Then: The save fails as a whole
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(ctx.get(extra).unwrap().id(), UNSAVED_ID);
    assert_eq!(ctx.state(player), Some(EntryState::Deleted));
    assert_eq!(ctx.pending_count(), 2);
    let courses = SqliteRepo::list_courses(ctx.connection()).unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(SqliteRepo::list_players(ctx.connection()).unwrap().len(), 1);

    // And: Removing the referencing hole score lets the retry succeed
    ctx.remove(score).unwrap();
    let summary = ctx.save().unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.deleted, 2);
    assert!(ctx.get(extra).unwrap().id() > 0);
    assert!(SqliteRepo::list_players(ctx.connection()).unwrap().is_empty());
}

#[test]
fn test_remove_unsaved_entity_is_discarded() {
    let mut ctx = setup_context();
    let key = ctx.track(Player::new("never saved").unwrap()).unwrap();

    ctx.remove(key).unwrap();

    assert!(!ctx.has_changes());
    assert_eq!(ctx.state(key), Some(EntryState::Detached));
    assert_eq!(ctx.get(key).unwrap_err().kind(), ExErrorKind::Removed);
    assert_eq!(ctx.save().unwrap().total(), 0);
}

#[test]
fn test_not_found_differs_from_empty_query() {
    // Given: An empty store
    let mut ctx = setup_context();

    // Then: Querying yields nothing, without error
    assert!(ctx.query::<Course>().unwrap().is_empty());

    // And: Finding a specific id is a NotFound error
    let err = ctx.find::<Course>(1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.code(), "ERR_NOT_FOUND");
}

#[test]
fn test_removed_stored_entity_not_found_after_save() {
    let mut ctx = setup_context();
    let key = ctx.track(Course::new("Gone Soon").unwrap()).unwrap();
    ctx.save().unwrap();
    let id = ctx.get(key).unwrap().id();

    ctx.remove(key).unwrap();
    ctx.save().unwrap();

    assert_eq!(
        ctx.find::<Course>(id).unwrap_err().kind(),
        ExErrorKind::NotFound
    );
    assert!(ctx.query::<Course>().unwrap().is_empty());
}

#[test]
fn test_course_mismatch_rejected_at_track() {
    // Given: A layout on one course
    let mut ctx = setup_context();
    let home = ctx.track(Course::new("Home").unwrap()).unwrap();
    let away = ctx.track(Course::new("Away").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(home, "Short").unwrap()).unwrap();

    // When: A hole claims the other course
    let err = ctx.track(Hole::new(1, away, layout, 3)).unwrap_err();

    // Then: Validation fails before anything is pending
    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(ctx.pending_count(), 3);
}

#[test]
fn test_tracking_stored_entity_rejected() {
    let mut ctx = setup_context();
    let err = ctx
        .track(Player::from_stored(7, "already stored".to_string()))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::AlreadyTracked);
}

#[test]
fn test_score_card_added_to_stored_round() {
    // Given: A stored round without scorecards
    let options = ContextOptions::shared_memory(format!("frolf-{}", uuid::Uuid::new_v4()));
    let mut ctx = FrolfContext::open(&options).unwrap();
    ctx.ensure_schema().unwrap();
    let date = Utc.with_ymd_and_hms(2024, 7, 20, 9, 0, 0).unwrap();
    let player = ctx.track(Player::new("solo").unwrap()).unwrap();
    let course = ctx.track(Course::new("Lakeside").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "Red").unwrap()).unwrap();
    let round = ctx
        .track(Round::new(course, layout, date, vec![player], Vec::new()))
        .unwrap();
    ctx.save().unwrap();

    // When: A new scorecard is added to the round
    let card = ctx
        .track(ScoreCard::new(course, layout, player, Vec::new()))
        .unwrap();
    ctx.add_score_card(round, card).unwrap();
    ctx.save().unwrap();

    // Then: Another context sees the scorecard under the round
    let mut reader = FrolfContext::open(&options).unwrap();
    let rounds = reader.query::<Round>().unwrap();
    assert_eq!(rounds[0].score_cards().len(), 1);
    let card = reader.get(rounds[0].score_cards()[0]).unwrap();
    assert_eq!(reader.get(card.player()).unwrap().user_name(), "solo");
}

#[test]
fn test_stored_score_card_moved_into_new_round() {
    // Given: A stored scorecard that belongs to no round
    let mut ctx = setup_context();
    let player = ctx.track(Player::new("late").unwrap()).unwrap();
    let course = ctx.track(Course::new("Hilltop").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "White").unwrap()).unwrap();
    let card = ctx
        .track(ScoreCard::new(course, layout, player, Vec::new()))
        .unwrap();
    ctx.save().unwrap();

    // When: A new round takes it over
    let round = ctx
        .track(Round::new(course, layout, Utc::now(), vec![player], vec![card]))
        .unwrap();
    ctx.save().unwrap();

    // Then: The scorecard row points at the round
    let round_id = ctx.get(round).unwrap().id();
    let cards = SqliteRepo::list_score_cards(ctx.connection()).unwrap();
    assert_eq!(cards[0].round_id, Some(round_id));
}

#[test]
fn test_unstorable_round_date_fails_save() {
    // Given: A round dated beyond the storable range
    let mut ctx = setup_context();
    let date = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
    let player = ctx.track(Player::new("far future").unwrap()).unwrap();
    let course = ctx.track(Course::new("Orbit").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "Long").unwrap()).unwrap();
    let round = ctx
        .track(Round::new(course, layout, date, vec![player], Vec::new()))
        .unwrap();

    // When: The context is saved
    let err = ctx.save().unwrap_err();

    // Then: Nothing is written and the round stays pending
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(ctx.state(round), Some(EntryState::Added));
    assert!(SqliteRepo::list_courses(ctx.connection()).unwrap().is_empty());
}

#[test]
fn test_score_card_cannot_join_second_round() {
    // Given: A scorecard already listed by a saved round
    let mut ctx = setup_context();
    let date = Utc.with_ymd_and_hms(2024, 8, 3, 10, 0, 0).unwrap();
    let player = ctx.track(Player::new("loyal").unwrap()).unwrap();
    let course = ctx.track(Course::new("Parkside").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "Gold").unwrap()).unwrap();
    let card = ctx
        .track(ScoreCard::new(course, layout, player, Vec::new()))
        .unwrap();
    let first = ctx
        .track(Round::new(course, layout, date, vec![player], vec![card]))
        .unwrap();
    let second = ctx
        .track(Round::new(course, layout, date, vec![player], Vec::new()))
        .unwrap();
    ctx.save().unwrap();

    // When: A second round claims it
    let err = ctx.add_score_card(second, card).unwrap_err();

    // Then: Refused, and nothing changed in memory or storage
    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(ctx.get(first).unwrap().score_cards(), &[card]);
    assert!(ctx.get(second).unwrap().score_cards().is_empty());
    assert!(!ctx.has_changes());

    // And: A round tracked with the same card is refused too
    let err = ctx
        .track(Round::new(course, layout, date, vec![player], vec![card]))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Validation);

    // And: Re-adding to the owning round is accepted
    ctx.add_score_card(first, card).unwrap();
    assert_eq!(ctx.get(first).unwrap().score_cards(), &[card]);
}

#[test]
fn test_score_card_for_other_course_rejected() {
    // Given: A round on one course and a scorecard on another
    let mut ctx = setup_context();
    let player = ctx.track(Player::new("wanderer").unwrap()).unwrap();
    let home = ctx.track(Course::new("Home").unwrap()).unwrap();
    let home_layout = ctx.track(Layout::new(home, "Short").unwrap()).unwrap();
    let away = ctx.track(Course::new("Away").unwrap()).unwrap();
    let away_layout = ctx.track(Layout::new(away, "Long").unwrap()).unwrap();
    let round = ctx
        .track(Round::new(home, home_layout, Utc::now(), vec![player], Vec::new()))
        .unwrap();
    let card = ctx
        .track(ScoreCard::new(away, away_layout, player, Vec::new()))
        .unwrap();

    // When: The scorecard is added to the round
    let err = ctx.add_score_card(round, card).unwrap_err();

    // Then: Validation fails and the round is untouched
    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert!(ctx.get(round).unwrap().score_cards().is_empty());
}

#[test]
fn test_hole_score_added_to_stored_card() {
    // Given: A stored scorecard and a stored hole score with no card
    let options = ContextOptions::shared_memory(format!("frolf-{}", uuid::Uuid::new_v4()));
    let mut ctx = FrolfContext::open(&options).unwrap();
    ctx.ensure_schema().unwrap();
    let player = ctx.track(Player::new("steady").unwrap()).unwrap();
    let course = ctx.track(Course::new("Creekside").unwrap()).unwrap();
    let layout = ctx.track(Layout::new(course, "Blue").unwrap()).unwrap();
    let hole = ctx.track(Hole::new(1, course, layout, 3)).unwrap();
    let score = ctx
        .track(HoleScore::new(vec![player], hole, 2).unwrap())
        .unwrap();
    let card = ctx
        .track(ScoreCard::new(course, layout, player, Vec::new()))
        .unwrap();
    let other = ctx
        .track(ScoreCard::new(course, layout, player, Vec::new()))
        .unwrap();
    ctx.save().unwrap();

    // When: The hole score is added to the card
    ctx.add_hole_score(card, score).unwrap();
    assert_eq!(ctx.state(card), Some(EntryState::Modified));
    ctx.save().unwrap();

    // Then: Another card cannot take it over
    let err = ctx.add_hole_score(other, score).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Validation);

    // And: A fresh context sees it under the first card only
    let mut reader = FrolfContext::open(&options).unwrap();
    let cards = reader.query::<ScoreCard>().unwrap();
    assert_eq!(cards[0].hole_scores().len(), 1);
    assert!(cards[1].hole_scores().is_empty());
}
