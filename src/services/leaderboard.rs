//! Per-player totals and the global ranking.
//!
//! Layout in the store:
//! - `player:stats:{userId}` hash: username, avatar, totals
//! - `player:level:{userId}:{n}` hash: the record for one completed level
//! - `player:{userId}:completed_levels` JSON array of completed level numbers
//! - `leaderboard:global` sorted set: userId -> totalPoints
//!
//! Players with equal totals are ordered however the store's reverse range
//! orders equal scores. That order is not part of the contract.

use crate::config::{Accumulation, GameConfig, ResubmissionPolicy};
use crate::db::Db;
use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::store::{float_field, int_field, KeyValueStore, Keys, StoreError, StoreResult};
use tracing::{debug, info};

enum Change {
    New,
    Improved { previous: i64 },
    Unchanged { previous: i64 },
}

pub fn load_player_stats(kv: &dyn KeyValueStore, user_id: &str) -> StoreResult<Option<PlayerStats>> {
    let key = Keys::player_stats(user_id);
    let fields = kv.hget_all(&key)?;
    if !fields.contains_key("totalPoints") {
        return Ok(None);
    }

    Ok(Some(PlayerStats {
        user_id: user_id.to_string(),
        username: fields.get("username").cloned().unwrap_or_default(),
        avatar_url: fields.get("avatarUrl").cloned().unwrap_or_default(),
        total_points: int_field(&fields, &key, "totalPoints")?,
        levels_completed: int_field(&fields, &key, "levelsCompleted")?,
        last_played: int_field(&fields, &key, "lastPlayed")?,
    }))
}

pub fn load_level_score(
    kv: &dyn KeyValueStore,
    user_id: &str,
    level_number: i64,
) -> StoreResult<Option<LevelScore>> {
    let key = Keys::player_level(user_id, level_number);
    let fields = kv.hget_all(&key)?;
    if !fields.contains_key("heroPoints") {
        return Ok(None);
    }

    Ok(Some(LevelScore {
        level_number,
        hero_points: int_field(&fields, &key, "heroPoints")?,
        allies_saved: int_field(&fields, &key, "alliesSaved")?,
        time_spent: float_field(&fields, &key, "timeSpent")?,
        retry_count: int_field(&fields, &key, "retryCount")?,
        completed_at: int_field(&fields, &key, "completedAt")?,
    }))
}

pub fn load_completed_levels(kv: &dyn KeyValueStore, user_id: &str) -> StoreResult<Vec<i64>> {
    let key = Keys::completed_levels(user_id);
    match kv.get(&key)? {
        Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)
            .map_err(|e| StoreError::corrupt(&key, format!("completed levels: {}", e))),
        _ => Ok(Vec::new()),
    }
}

fn save_completed_levels(kv: &dyn KeyValueStore, user_id: &str, levels: &[i64]) -> StoreResult<()> {
    let key = Keys::completed_levels(user_id);
    let encoded = serde_json::to_string(levels)
        .map_err(|e| StoreError::corrupt(&key, format!("completed levels: {}", e)))?;
    kv.set(&key, &encoded)
}

/// 1-based rank, 0 when the player is not on the board.
pub fn rank_of(kv: &dyn KeyValueStore, user_id: &str) -> StoreResult<u64> {
    Ok(kv
        .zrevrank(&Keys::leaderboard(), user_id)?
        .map(|position| position + 1)
        .unwrap_or(0))
}

/// Apply one validated level completion to the player's records and the
/// ranking. Must run inside a single atomic unit.
pub fn apply_score(
    kv: &dyn KeyValueStore,
    game: &GameConfig,
    record: &ScoreRecord<'_>,
    now: i64,
) -> StoreResult<SubmitOutcome> {
    let existing = load_level_score(kv, record.user_id, record.level_number)?;
    let stats = load_player_stats(kv, record.user_id)?;

    let change = match existing {
        None => Change::New,
        Some(prev)
            if game.resubmission == ResubmissionPolicy::KeepBest
                && record.hero_points > prev.hero_points =>
        {
            Change::Improved {
                previous: prev.hero_points,
            }
        }
        Some(prev) => Change::Unchanged {
            previous: prev.hero_points,
        },
    };

    if let Change::Unchanged { previous } = change {
        debug!(
            "Level {} for {} not updated ({} <= {})",
            record.level_number, record.user_id, record.hero_points, previous
        );
        return Ok(SubmitOutcome {
            total_points: stats.as_ref().map(|s| s.total_points).unwrap_or(0),
            rank: rank_of(kv, record.user_id)?,
            level_points: previous,
            updated: false,
        });
    }

    kv.hset(
        &Keys::player_level(record.user_id, record.level_number),
        &[
            ("levelNumber", record.level_number.to_string()),
            ("heroPoints", record.hero_points.to_string()),
            ("alliesSaved", record.allies_saved.to_string()),
            ("timeSpent", record.time_spent.to_string()),
            ("retryCount", record.retry_count.to_string()),
            ("completedAt", now.to_string()),
        ],
    )?;

    let mut levels = load_completed_levels(kv, record.user_id)?;
    if matches!(change, Change::New) && !levels.contains(&record.level_number) {
        levels.push(record.level_number);
        save_completed_levels(kv, record.user_id, &levels)?;
    }

    let (total_points, levels_completed) = match game.accumulation {
        Accumulation::Incremental => {
            let (mut total, mut completed) = stats
                .as_ref()
                .map(|s| (s.total_points, s.levels_completed))
                .unwrap_or((0, 0));
            match change {
                Change::New => {
                    completed += 1;
                    total += record.hero_points;
                }
                Change::Improved { previous } => {
                    total = total - previous + record.hero_points;
                }
                Change::Unchanged { .. } => {}
            }
            (total, completed)
        }
        Accumulation::Recompute => {
            let known = stats.as_ref().map(|s| s.levels_completed).unwrap_or(0);
            let expected = if matches!(change, Change::New) { known + 1 } else { known };
            if (levels.len() as i64) < expected {
                return Err(StoreError::corrupt(
                    &Keys::completed_levels(record.user_id),
                    format!("lists {} levels, stats count {}", levels.len(), expected),
                ));
            }
            let mut total = 0;
            for level in &levels {
                if let Some(score) = load_level_score(kv, record.user_id, *level)? {
                    total += score.hero_points;
                }
            }
            (total, levels.len() as i64)
        }
    };

    let mut stats_update = vec![
        ("userId", record.user_id.to_string()),
        ("username", record.username.to_string()),
        ("totalPoints", total_points.to_string()),
        ("levelsCompleted", levels_completed.to_string()),
        ("lastPlayed", now.to_string()),
    ];
    if !record.avatar_url.is_empty() {
        stats_update.push(("avatarUrl", record.avatar_url.to_string()));
    }
    kv.hset(&Keys::player_stats(record.user_id), &stats_update)?;

    kv.zadd(&Keys::leaderboard(), record.user_id, total_points)?;

    let rank = rank_of(kv, record.user_id)?;
    info!(
        "Score recorded: {} level {} -> {} points (total {}, rank {})",
        record.user_id, record.level_number, record.hero_points, total_points, rank
    );

    Ok(SubmitOutcome {
        total_points,
        rank,
        level_points: record.hero_points,
        updated: true,
    })
}

pub fn submit_score(
    db: &Db,
    game: &GameConfig,
    record: &ScoreRecord<'_>,
    now: i64,
) -> Result<SubmitOutcome, AppError> {
    Ok(db.atomically(|kv| apply_score(kv, game, record, now))?)
}

pub fn get_top_players(db: &Db, limit: u64) -> Result<Vec<LeaderboardEntry>, AppError> {
    Ok(db.run(|kv| {
        let top = kv.zrevrange(&Keys::leaderboard(), 0, limit)?;

        let mut entries = Vec::with_capacity(top.len());
        for (position, (user_id, total_points)) in top.into_iter().enumerate() {
            let stats = kv.hget_all(&Keys::player_stats(&user_id))?;
            entries.push(LeaderboardEntry {
                rank: position as u64 + 1,
                username: stats
                    .get("username")
                    .filter(|name| !name.is_empty())
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                avatar_url: stats.get("avatarUrl").cloned().unwrap_or_default(),
                user_id,
                total_points,
            });
        }
        Ok::<_, StoreError>(entries)
    })?)
}

pub fn get_player_rank(db: &Db, user_id: &str) -> Result<u64, AppError> {
    Ok(db.run(|kv| rank_of(kv, user_id))?)
}

pub fn get_player_standing(db: &Db, user_id: &str) -> Result<Option<PlayerStanding>, AppError> {
    Ok(db.run(|kv| {
        let Some(stats) = load_player_stats(kv, user_id)? else {
            return Ok::<_, StoreError>(None);
        };
        Ok(Some(PlayerStanding {
            rank: rank_of(kv, user_id)?,
            total_points: stats.total_points,
            levels_completed: stats.levels_completed,
        }))
    })?)
}
