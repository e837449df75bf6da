//! Aggregate game-result storage

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;

use super::parse::OptionalExt;
use crate::error::Result;
use crate::models::PlayerStats;

/// Points credited to the winner of a game.
const WIN_POINTS: i64 = 50;

/// Points credited to every other participant.
const PARTICIPATION_POINTS: i64 = 10;

pub struct StatsStore<'a> {
    conn: &'a Connection,
}

impl<'a> StatsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record one completed game: every participant +1 played, the winner
    /// +1 win and +50 points, everyone else +10 points. Rows are upserted
    /// so guest tags accumulate stats alongside registered accounts.
    #[instrument(skip(self, participant_ids), fields(participants = participant_ids.len()))]
    pub fn record_game_result(
        &self,
        winner_id: Option<&str>,
        participant_ids: &[String],
    ) -> Result<()> {
        let recorded_at = Utc::now().to_rfc3339();
        for user_id in participant_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO player_stats (user_id) VALUES (?1)",
                params![user_id],
            )?;
            self.conn.execute(
                "UPDATE player_stats
                 SET games_played = games_played + 1, last_result_at = ?2
                 WHERE user_id = ?1",
                params![user_id, recorded_at],
            )?;
            if winner_id == Some(user_id.as_str()) {
                self.conn.execute(
                    "UPDATE player_stats SET wins = wins + 1, points = points + ?2 WHERE user_id = ?1",
                    params![user_id, WIN_POINTS],
                )?;
            } else {
                self.conn.execute(
                    "UPDATE player_stats SET points = points + ?2 WHERE user_id = ?1",
                    params![user_id, PARTICIPATION_POINTS],
                )?;
            }
        }
        Ok(())
    }

    /// Look up one user's aggregate stats
    pub fn get(&self, user_id: &str) -> Result<Option<PlayerStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT games_played, wins, points FROM player_stats WHERE user_id = ?1",
        )?;

        let stats = stmt
            .query_row(params![user_id], |row| {
                Ok(PlayerStats {
                    games_played: row.get::<_, i64>(0)? as u64,
                    wins: row.get::<_, i64>(1)? as u64,
                    points: row.get::<_, i64>(2)? as u64,
                })
            })
            .optional()?;

        Ok(stats)
    }
}
