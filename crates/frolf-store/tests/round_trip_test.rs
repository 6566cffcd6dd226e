// Integration tests for insert-and-read-back behavior
// Covers: in-memory round trip, cross-context visibility (shared memory and
// file), many-to-many player sets, and a complete round graph

use chrono::{TimeZone, Utc};
use frolf_core::{Course, Entity, Hole, HoleScore, Layout, Player, Round, ScoreCard};
use frolf_store::{ContextOptions, FrolfContext};

fn setup_context(options: &ContextOptions) -> FrolfContext {
    let mut ctx = FrolfContext::open(options).unwrap();
    ctx.ensure_schema().unwrap();
    ctx
}

fn shared_options() -> ContextOptions {
    ContextOptions::shared_memory(format!("frolf-{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_adding_player_works() {
    // Given: A fresh in-memory store
    let mut ctx = setup_context(&ContextOptions::in_memory());

    // When: A player is tracked and saved
    ctx.track(Player::new("PlayerName").unwrap()).unwrap();
    ctx.save().unwrap();

    // Then: Querying players returns exactly that player
    let players = ctx.query::<Player>().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].user_name(), "PlayerName");
    assert!(players[0].id() > 0);
}

#[test]
fn test_adding_course_visible_from_second_context() {
    // Given: A shared in-memory store kept alive by the first context
    let options = shared_options();
    let mut writer = setup_context(&options);

    // When: A course is saved through the first context
    writer.track(Course::new("Name").unwrap()).unwrap();
    writer.save().unwrap();

    // Then: A second context over the same store sees it
    let mut reader = setup_context(&options);
    let courses = reader.query::<Course>().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].name(), "Name");

    drop(writer);
}

#[test]
fn test_file_store_survives_reopen() {
    // Given: A file-backed store
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.db");

    // When: A player is saved and the context closed
    let saved_id = {
        let mut ctx = FrolfContext::open_file(&path).unwrap();
        ctx.ensure_schema().unwrap();
        let key = ctx.track(Player::new("Paige").unwrap()).unwrap();
        ctx.save().unwrap();
        let id = ctx.get(key).unwrap().id();
        ctx.close().unwrap();
        id
    };

    // Then: A new context on the same file finds the player by id
    let mut ctx = FrolfContext::open_file(&path).unwrap();
    assert_eq!(ctx.ensure_schema().unwrap(), 0);
    let key = ctx.find::<Player>(saved_id).unwrap();
    assert_eq!(ctx.get(key).unwrap().user_name(), "Paige");
}

#[test]
fn test_hole_score_with_two_players_round_trips() {
    // Given: A hole score attributed to two players
    let options = shared_options();
    let mut writer = setup_context(&options);
    let alice = writer.track(Player::new("alice").unwrap()).unwrap();
    let bob = writer.track(Player::new("bob").unwrap()).unwrap();
    let course = writer.track(Course::new("Maple Hill").unwrap()).unwrap();
    let layout = writer.track(Layout::new(course, "Doubles").unwrap()).unwrap();
    let hole = writer.track(Hole::new(1, course, layout, 3)).unwrap();
    writer
        .track(HoleScore::new(vec![alice, bob], hole, 2).unwrap())
        .unwrap();

    // When: It is saved and read from another context
    writer.save().unwrap();
    let mut reader = setup_context(&options);
    let scores = reader.query::<HoleScore>().unwrap();

    // Then: Both players are associated, in order
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score(), 2);
    let names: Vec<String> = scores[0]
        .players()
        .iter()
        .map(|key| reader.get(*key).unwrap().user_name().to_string())
        .collect();
    assert_eq!(names, vec!["alice", "bob"]);

    let hole = reader.get(scores[0].hole()).unwrap();
    assert_eq!(hole.number(), 1);
    assert_eq!(hole.par(), 3);
}

#[test]
fn test_full_round_graph_round_trips() {
    // Given: A round with two players, each with a scorecard over two holes
    let options = shared_options();
    let mut writer = setup_context(&options);
    let date = Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap();

    let course = writer.track(Course::new("Riverside").unwrap()).unwrap();
    let layout = writer.track(Layout::new(course, "Blue").unwrap()).unwrap();
    let holes = [
        writer.track(Hole::new(1, course, layout, 3)).unwrap(),
        writer.track(Hole::new(2, course, layout, 4)).unwrap(),
    ];
    let players = [
        writer.track(Player::new("alice").unwrap()).unwrap(),
        writer.track(Player::new("bob").unwrap()).unwrap(),
    ];

    let mut cards = Vec::new();
    for (player, strokes) in players.iter().zip([[3, 5], [2, 4]]) {
        let scores = holes
            .iter()
            .zip(strokes)
            .map(|(hole, score)| {
                writer
                    .track(HoleScore::new(vec![*player], *hole, score).unwrap())
                    .unwrap()
            })
            .collect();
        cards.push(
            writer
                .track(ScoreCard::new(course, layout, *player, scores))
                .unwrap(),
        );
    }
    writer
        .track(Round::new(course, layout, date, players.to_vec(), cards))
        .unwrap();

    // When: Everything is saved in one go
    let summary = writer.save().unwrap();
    assert_eq!(summary.inserted, 1 + 1 + 2 + 2 + 4 + 2 + 1);

    // Then: A second context rebuilds the same graph
    let mut reader = setup_context(&options);
    let rounds = reader.query::<Round>().unwrap();
    assert_eq!(rounds.len(), 1);
    let round = &rounds[0];
    assert_eq!(round.date(), date);
    assert_eq!(reader.get(round.course()).unwrap().name(), "Riverside");
    assert_eq!(reader.get(round.layout()).unwrap().name(), "Blue");
    assert_eq!(round.players().len(), 2);
    assert_eq!(round.score_cards().len(), 2);

    let mut totals = Vec::new();
    for card_key in round.score_cards() {
        let card = reader.get(*card_key).unwrap();
        let player = reader.get(card.player()).unwrap().user_name().to_string();
        let total: i32 = card
            .hole_scores()
            .iter()
            .map(|key| reader.get(*key).unwrap().score())
            .sum();
        totals.push((player, total));
    }
    assert_eq!(
        totals,
        vec![("alice".to_string(), 8), ("bob".to_string(), 6)]
    );

    // And: The layout lists its holes in insertion order
    let layout = reader.get(round.layout()).unwrap();
    let numbers: Vec<i32> = layout
        .holes()
        .iter()
        .map(|key| reader.get(*key).unwrap().number())
        .collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn test_round_date_keeps_sub_millisecond_precision() {
    // Given: A round dated with a non-zero nanosecond part
    let options = shared_options();
    let mut writer = setup_context(&options);
    let date = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let course = writer.track(Course::new("Precision Park").unwrap()).unwrap();
    let layout = writer.track(Layout::new(course, "Main").unwrap()).unwrap();
    let player = writer.track(Player::new("timer").unwrap()).unwrap();
    let round = writer
        .track(Round::new(course, layout, date, vec![player], Vec::new()))
        .unwrap();
    writer.save().unwrap();

    // When: Another context reads it back
    let mut reader = setup_context(&options);
    let rounds = reader.query::<Round>().unwrap();

    // Then: Both contexts agree on the exact instant
    assert_eq!(rounds[0].date(), date);
    assert_eq!(writer.get(round).unwrap().date(), rounds[0].date());

    // And: An update keeps the precision too
    let later = Utc.timestamp_opt(1_700_000_060, 987_654_321).unwrap();
    writer.get_mut(round).unwrap().set_date(later);
    writer.save().unwrap();
    let mut fresh = setup_context(&options);
    assert_eq!(fresh.query::<Round>().unwrap()[0].date(), later);
}
