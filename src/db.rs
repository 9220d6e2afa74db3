use crate::store::{SqliteKv, StoreError};
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = include_str!("schema.sql");

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str, busy_timeout: Duration) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run store operations, reads or writes, outside any transaction.
    /// Each operation commits on its own; an error does not undo earlier ones.
    pub fn run<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&SqliteKv<'_>) -> Result<T, E>,
    {
        let conn = self.lock();
        f(&SqliteKv::new(&conn))
    }

    /// Run a read-modify-write sequence as one unit. Writers are serialized
    /// both in-process (connection mutex) and across processes sharing the
    /// file (IMMEDIATE transaction). Any error rolls the whole unit back.
    pub fn atomically<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&SqliteKv<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let out = f(&SqliteKv::new(&tx))?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;

    #[test]
    fn test_failed_unit_rolls_back() {
        let db = Db::open_in_memory().unwrap();
        let result: Result<(), StoreError> = db.atomically(|kv| {
            kv.set("k", "v")?;
            Err(StoreError::corrupt("k", "forced failure"))
        });
        assert!(result.is_err());

        let value = db.run(|kv| kv.get("k")).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_committed_unit_is_visible() {
        let db = Db::open_in_memory().unwrap();
        db.atomically(|kv| {
            kv.set("k", "v")?;
            kv.zadd("z", "m", 3)
        })
        .unwrap();

        let (value, score) = db
            .run(|kv| Ok::<_, StoreError>((kv.get("k")?, kv.zscore("z", "m")?)))
            .unwrap();
        assert_eq!(value.as_deref(), Some("v"));
        assert_eq!(score, Some(3));
    }

    #[test]
    fn test_run_commits_each_write() {
        let db = Db::open_in_memory().unwrap();
        let result: Result<(), StoreError> = db.run(|kv| {
            assert!(kv.set_nx("k", "first")?);
            Err(StoreError::corrupt("k", "forced failure"))
        });
        assert!(result.is_err());

        let value = db.run(|kv| kv.get("k")).unwrap();
        assert_eq!(value.as_deref(), Some("first"));
    }
}
