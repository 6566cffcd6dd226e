//! SQLite repository implementation
//!
//! Plain row access for every table of the score model. Functions take a
//! `&Connection`, so a `Transaction` can be passed through deref.

use frolf_core::EntityKind;
use rusqlite::{Connection, Params, Row};

use crate::errors::{from_rusqlite, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub id: i64,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRow {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleRow {
    pub id: i64,
    pub course_id: i64,
    pub layout_id: i64,
    pub number: i32,
    pub par: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRow {
    pub id: i64,
    pub course_id: i64,
    pub layout_id: i64,
    /// Nanoseconds since the Unix epoch, UTC
    pub played_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCardRow {
    pub id: i64,
    pub course_id: i64,
    pub layout_id: i64,
    pub player_id: i64,
    pub round_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleScoreRow {
    pub id: i64,
    pub hole_id: i64,
    pub score: i32,
    pub score_card_id: Option<i64>,
}

/// A join-table row: owner id, player id, in position order
pub type PlayerLink = (i64, i64);

/// SQLite repository for the score model
pub struct SqliteRepo;

impl SqliteRepo {
    // ===== Players =====

    /// Insert a player and return its assigned id
    pub fn insert_player(conn: &Connection, user_name: &str) -> Result<i64> {
        conn.execute("INSERT INTO players (user_name) VALUES (?1)", [user_name])
            .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_player(conn: &Connection, id: i64, user_name: &str) -> Result<()> {
        conn.execute(
            "UPDATE players SET user_name = ?1 WHERE id = ?2",
            rusqlite::params![user_name, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_players(conn: &Connection) -> Result<Vec<PlayerRow>> {
        query_all(
            conn,
            "SELECT id, user_name FROM players ORDER BY id",
            [],
            |row| {
                Ok(PlayerRow {
                    id: row.get(0)?,
                    user_name: row.get(1)?,
                })
            },
        )
    }

    // ===== Courses =====

    /// Insert a course and return its assigned id
    pub fn insert_course(conn: &Connection, name: &str) -> Result<i64> {
        conn.execute("INSERT INTO courses (name) VALUES (?1)", [name])
            .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_course(conn: &Connection, id: i64, name: &str) -> Result<()> {
        conn.execute(
            "UPDATE courses SET name = ?1 WHERE id = ?2",
            rusqlite::params![name, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_courses(conn: &Connection) -> Result<Vec<CourseRow>> {
        query_all(conn, "SELECT id, name FROM courses ORDER BY id", [], |row| {
            Ok(CourseRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
    }

    // ===== Layouts =====

    /// Insert a layout and return its assigned id
    pub fn insert_layout(conn: &Connection, course_id: i64, name: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO layouts (course_id, name) VALUES (?1, ?2)",
            rusqlite::params![course_id, name],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_layout(conn: &Connection, id: i64, name: &str) -> Result<()> {
        conn.execute(
            "UPDATE layouts SET name = ?1 WHERE id = ?2",
            rusqlite::params![name, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_layouts(conn: &Connection) -> Result<Vec<LayoutRow>> {
        query_all(
            conn,
            "SELECT id, course_id, name FROM layouts ORDER BY id",
            [],
            |row| {
                Ok(LayoutRow {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
    }

    // ===== Holes =====

    /// Insert a hole and return its assigned id
    pub fn insert_hole(
        conn: &Connection,
        course_id: i64,
        layout_id: i64,
        number: i32,
        par: i32,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO holes (course_id, layout_id, number, par) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![course_id, layout_id, number, par],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_hole(conn: &Connection, id: i64, number: i32, par: i32) -> Result<()> {
        conn.execute(
            "UPDATE holes SET number = ?1, par = ?2 WHERE id = ?3",
            rusqlite::params![number, par, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_holes(conn: &Connection) -> Result<Vec<HoleRow>> {
        query_all(
            conn,
            "SELECT id, course_id, layout_id, number, par FROM holes ORDER BY id",
            [],
            |row| {
                Ok(HoleRow {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    layout_id: row.get(2)?,
                    number: row.get(3)?,
                    par: row.get(4)?,
                })
            },
        )
    }

    // ===== Rounds =====

    /// Insert a round and return its assigned id
    pub fn insert_round(
        conn: &Connection,
        course_id: i64,
        layout_id: i64,
        played_at: i64,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO rounds (course_id, layout_id, played_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![course_id, layout_id, played_at],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_round(conn: &Connection, id: i64, played_at: i64) -> Result<()> {
        conn.execute(
            "UPDATE rounds SET played_at = ?1 WHERE id = ?2",
            rusqlite::params![played_at, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_rounds(conn: &Connection) -> Result<Vec<RoundRow>> {
        query_all(
            conn,
            "SELECT id, course_id, layout_id, played_at FROM rounds ORDER BY id",
            [],
            |row| {
                Ok(RoundRow {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    layout_id: row.get(2)?,
                    played_at: row.get(3)?,
                })
            },
        )
    }

    // ===== Score cards =====

    /// Insert a score card and return its assigned id
    pub fn insert_score_card(
        conn: &Connection,
        course_id: i64,
        layout_id: i64,
        player_id: i64,
        round_id: Option<i64>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO score_cards (course_id, layout_id, player_id, round_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![course_id, layout_id, player_id, round_id],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Move a score card under a round
    pub fn set_round_id(conn: &Connection, score_card_id: i64, round_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE score_cards SET round_id = ?1 WHERE id = ?2",
            rusqlite::params![round_id, score_card_id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_score_cards(conn: &Connection) -> Result<Vec<ScoreCardRow>> {
        query_all(
            conn,
            "SELECT id, course_id, layout_id, player_id, round_id FROM score_cards ORDER BY id",
            [],
            |row| {
                Ok(ScoreCardRow {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    layout_id: row.get(2)?,
                    player_id: row.get(3)?,
                    round_id: row.get(4)?,
                })
            },
        )
    }

    // ===== Hole scores =====

    /// Insert a hole score and return its assigned id
    pub fn insert_hole_score(
        conn: &Connection,
        hole_id: i64,
        score: i32,
        score_card_id: Option<i64>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO hole_scores (hole_id, score, score_card_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![hole_id, score, score_card_id],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_hole_score(conn: &Connection, id: i64, score: i32) -> Result<()> {
        conn.execute(
            "UPDATE hole_scores SET score = ?1 WHERE id = ?2",
            rusqlite::params![score, id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Move a hole score onto a score card
    pub fn set_score_card_id(
        conn: &Connection,
        hole_score_id: i64,
        score_card_id: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE hole_scores SET score_card_id = ?1 WHERE id = ?2",
            rusqlite::params![score_card_id, hole_score_id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn list_hole_scores(conn: &Connection) -> Result<Vec<HoleScoreRow>> {
        query_all(
            conn,
            "SELECT id, hole_id, score, score_card_id FROM hole_scores ORDER BY id",
            [],
            |row| {
                Ok(HoleScoreRow {
                    id: row.get(0)?,
                    hole_id: row.get(1)?,
                    score: row.get(2)?,
                    score_card_id: row.get(3)?,
                })
            },
        )
    }

    // ===== Player sets =====

    /// Replace the players attributed to a hole score, keeping slice order
    pub fn replace_hole_score_players(
        conn: &Connection,
        hole_score_id: i64,
        player_ids: &[i64],
    ) -> Result<()> {
        replace_links(conn, "hole_score_players", "hole_score_id", hole_score_id, player_ids)
    }

    /// Replace the players of a round, keeping slice order
    pub fn replace_round_players(
        conn: &Connection,
        round_id: i64,
        player_ids: &[i64],
    ) -> Result<()> {
        replace_links(conn, "round_players", "round_id", round_id, player_ids)
    }

    pub fn list_hole_score_players(conn: &Connection) -> Result<Vec<PlayerLink>> {
        query_all(
            conn,
            "SELECT hole_score_id, player_id FROM hole_score_players
             ORDER BY hole_score_id, position",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    pub fn list_round_players(conn: &Connection) -> Result<Vec<PlayerLink>> {
        query_all(
            conn,
            "SELECT round_id, player_id FROM round_players ORDER BY round_id, position",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    // ===== Deletes =====

    /// Delete one row, and the join rows it owns
    ///
    /// Nothing cascades: rows still referencing this one make the delete
    /// fail with a foreign key violation.
    pub fn delete_row(conn: &Connection, kind: EntityKind, id: i64) -> Result<()> {
        match kind {
            EntityKind::HoleScore => {
                conn.execute(
                    "DELETE FROM hole_score_players WHERE hole_score_id = ?1",
                    [id],
                )
                .map_err(from_rusqlite)?;
            }
            EntityKind::Round => {
                conn.execute("DELETE FROM round_players WHERE round_id = ?1", [id])
                    .map_err(from_rusqlite)?;
            }
            _ => {}
        }

        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        conn.execute(&sql, [id]).map_err(from_rusqlite)?;

        Ok(())
    }

    /// Count rows of a table backing an entity kind
    pub fn count(conn: &Connection, kind: EntityKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        conn.query_row(&sql, [], |row| row.get(0))
            .map_err(from_rusqlite)
    }
}

fn replace_links(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    player_ids: &[i64],
) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", table, owner_column),
        [owner_id],
    )
    .map_err(from_rusqlite)?;

    let sql = format!(
        "INSERT INTO {} ({}, player_id, position) VALUES (?1, ?2, ?3)",
        table, owner_column
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    for (position, player_id) in player_ids.iter().enumerate() {
        stmt.execute(rusqlite::params![owner_id, player_id, position as i64])
            .map_err(from_rusqlite)?;
    }

    Ok(())
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(params, map)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}
