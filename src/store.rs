//! Key-value primitives the game state is persisted through.
//!
//! The layout follows a Redis-style model (strings, hashes, sorted sets) so
//! key names stay portable, while the default backend keeps everything in the
//! SQLite file opened by [`crate::db::Db`].

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Busy or locked database: the caller may retry the whole request.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Returns true when the value was written, false when the key already existed.
    fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool>;

    fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> StoreResult<()>;

    fn zadd(&self, key: &str, member: &str, score: i64) -> StoreResult<()>;
    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<i64>>;
    /// 0-based position counted from the highest score.
    fn zrevrank(&self, key: &str, member: &str) -> StoreResult<Option<u64>>;
    /// Members ordered from the highest score, skipping `offset`, at most `limit`.
    fn zrevrange(&self, key: &str, offset: u64, limit: u64) -> StoreResult<Vec<(String, i64)>>;
}

/// Store view over a borrowed connection (or an open transaction, which
/// derefs to one).
pub struct SqliteKv<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteKv<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteKv { conn }
    }
}

impl KeyValueStore for SqliteKv<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM kv_strings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_strings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO kv_strings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(changed == 1)
    }

    fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT field, value FROM kv_hashes WHERE key = ?1")?;
        let rows = stmt.query_map(params![key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut fields = HashMap::new();
        for row in rows {
            let (field, value) = row?;
            fields.insert(field, value);
        }
        Ok(fields)
    }

    fn hset(&self, key: &str, fields: &[(&str, String)]) -> StoreResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT OR REPLACE INTO kv_hashes (key, field, value) VALUES (?1, ?2, ?3)",
        )?;
        for (field, value) in fields {
            stmt.execute(params![key, field, value])?;
        }
        Ok(())
    }

    fn zadd(&self, key: &str, member: &str, score: i64) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_zsets (key, member, score) VALUES (?1, ?2, ?3)",
            params![key, member, score],
        )?;
        Ok(())
    }

    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT score FROM kv_zsets WHERE key = ?1 AND member = ?2",
                params![key, member],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn zrevrank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        let Some(score) = self.zscore(key, member)? else {
            return Ok(None);
        };
        // Same ordering as zrevrange: score desc, then member desc.
        let ahead: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM kv_zsets
             WHERE key = ?1 AND (score > ?2 OR (score = ?2 AND member > ?3))",
            params![key, score, member],
            |row| row.get(0),
        )?;
        Ok(Some(ahead as u64))
    }

    fn zrevrange(&self, key: &str, offset: u64, limit: u64) -> StoreResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT member, score FROM kv_zsets WHERE key = ?1
             ORDER BY score DESC, member DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![key, limit as i64, offset as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }
}

/// Key patterns owned by the game server.
pub struct Keys;

impl Keys {
    pub fn launch_time() -> String {
        "game:launchTime".to_string()
    }

    pub fn leaderboard() -> String {
        "leaderboard:global".to_string()
    }

    pub fn player_stats(user_id: &str) -> String {
        format!("player:stats:{}", user_id)
    }

    pub fn player_level(user_id: &str, level_number: i64) -> String {
        format!("player:level:{}:{}", user_id, level_number)
    }

    pub fn completed_levels(user_id: &str) -> String {
        format!("player:{}:completed_levels", user_id)
    }
}

/// Parse an integer field out of a hash, treating a missing field as 0.
pub fn int_field(fields: &HashMap<String, String>, key: &str, field: &str) -> StoreResult<i64> {
    match fields.get(field) {
        Some(raw) => raw
            .parse()
            .map_err(|_| StoreError::corrupt(key, format!("{} is not an integer: {:?}", field, raw))),
        None => Ok(0),
    }
}

pub fn float_field(fields: &HashMap<String, String>, key: &str, field: &str) -> StoreResult<f64> {
    match fields.get(field) {
        Some(raw) => raw
            .parse()
            .map_err(|_| StoreError::corrupt(key, format!("{} is not a number: {:?}", field, raw))),
        None => Ok(0.0),
    }
}
