//! Daily level unlocks, global for all players.
//!
//! A fixed set of levels is open at launch and one more opens every 24h
//! after the persisted launch time. Nothing ticks: status is derived on
//! demand from the launch timestamp and the caller's `now`.

use crate::config::GameConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::levels::{LevelUnlockInfo, UnlockStatus};
use crate::store::{KeyValueStore, Keys, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSchedule {
    pub total_levels: i64,
    pub initially_unlocked: i64,
}

impl UnlockSchedule {
    pub fn new(total_levels: i64, initially_unlocked: i64) -> Self {
        UnlockSchedule {
            total_levels,
            initially_unlocked,
        }
    }

    pub fn from_config(game: &GameConfig) -> Self {
        Self::new(game.total_levels, game.initially_unlocked)
    }

    /// Whole days since launch. A launch time in the future counts as day 0.
    pub fn days_elapsed(launch_time: i64, now: i64) -> i64 {
        (now - launch_time).div_euclid(MS_PER_DAY).max(0)
    }

    pub fn status_at(&self, launch_time: i64, now: i64) -> UnlockStatus {
        let days_elapsed = Self::days_elapsed(launch_time, now);
        let unlocked_levels = (self.initially_unlocked + days_elapsed).min(self.total_levels);

        let next_unlock_time = if unlocked_levels < self.total_levels {
            Some(launch_time + (days_elapsed + 1) * MS_PER_DAY)
        } else {
            None
        };

        UnlockStatus {
            unlocked_levels,
            next_unlock_time,
            total_levels: self.total_levels,
            days_elapsed,
        }
    }

    /// When `level_number` opens; None for levels open from launch.
    pub fn unlock_time(&self, level_number: i64, launch_time: i64) -> Option<i64> {
        if level_number < self.initially_unlocked {
            return None;
        }
        let days_until_unlock = level_number - self.initially_unlocked + 1;
        Some(launch_time + days_until_unlock * MS_PER_DAY)
    }

    pub fn levels_at(&self, launch_time: i64, now: i64) -> Vec<LevelUnlockInfo> {
        let status = self.status_at(launch_time, now);

        (0..self.total_levels)
            .map(|level_number| {
                let is_unlocked = level_number < status.unlocked_levels;
                let unlock_time = if is_unlocked {
                    None
                } else {
                    self.unlock_time(level_number, launch_time)
                };
                LevelUnlockInfo {
                    level_number,
                    is_unlocked,
                    unlock_time,
                    time_until_unlock: unlock_time.map(|t| (t - now).max(0)),
                }
            })
            .collect()
    }

    pub fn is_unlocked_at(&self, level_number: i64, launch_time: i64, now: i64) -> bool {
        if level_number < 0 || level_number >= self.total_levels {
            return false;
        }
        level_number < self.status_at(launch_time, now).unlocked_levels
    }
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

pub fn load_launch_time(kv: &dyn KeyValueStore) -> StoreResult<Option<i64>> {
    let key = Keys::launch_time();
    match kv.get(&key)? {
        Some(raw) if !raw.is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| StoreError::corrupt(&key, format!("launch time is not an integer: {:?}", raw))),
        _ => Ok(None),
    }
}

/// Return the persisted launch time, persisting `now` first if there is none.
/// An existing value is never overwritten, so concurrent first calls agree.
pub fn ensure_launch_time(kv: &dyn KeyValueStore, now: i64) -> StoreResult<i64> {
    if let Some(launch_time) = load_launch_time(kv)? {
        return Ok(launch_time);
    }

    let key = Keys::launch_time();
    if kv.set_nx(&key, &now.to_string())? {
        info!("Game launch time initialized: {}", format_millis(now));
        return Ok(now);
    }

    // Another writer got there between our read and the set-if-absent.
    load_launch_time(kv)?
        .ok_or_else(|| StoreError::corrupt(&key, "launch time vanished after set-if-absent"))
}

pub fn initialize_launch_time(db: &Db, now: i64) -> Result<i64, AppError> {
    let (existing, launch_time) = db.run(|kv| {
        let existing = load_launch_time(kv)?;
        Ok::<_, StoreError>((existing, ensure_launch_time(kv, now)?))
    })?;
    if existing.is_some() {
        info!("Launch time already set: {}", format_millis(launch_time));
    }
    Ok(launch_time)
}

pub fn get_unlock_status(
    db: &Db,
    schedule: &UnlockSchedule,
    now: i64,
) -> Result<UnlockStatus, AppError> {
    // With no launch time this persists `now`, which yields the day-0 baseline.
    let launch_time = db.run(|kv| ensure_launch_time(kv, now))?;
    let status = schedule.status_at(launch_time, now);
    debug!(
        "Unlock status: {}/{} levels, day {}",
        status.unlocked_levels, status.total_levels, status.days_elapsed
    );
    Ok(status)
}

pub fn get_all_levels_unlock_info(
    db: &Db,
    schedule: &UnlockSchedule,
    now: i64,
) -> Result<Vec<LevelUnlockInfo>, AppError> {
    let launch_time = db.run(|kv| ensure_launch_time(kv, now))?;
    Ok(schedule.levels_at(launch_time, now))
}

pub fn is_level_unlocked(
    db: &Db,
    schedule: &UnlockSchedule,
    level_number: i64,
    now: i64,
) -> Result<bool, AppError> {
    if level_number < 0 || level_number >= schedule.total_levels {
        return Ok(false);
    }
    let launch_time = db.run(|kv| ensure_launch_time(kv, now))?;
    Ok(schedule.is_unlocked_at(level_number, launch_time, now))
}
