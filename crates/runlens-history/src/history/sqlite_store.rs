//! SQLite-backed history store.
//!
//! This module is feature-gated behind `sqlite-persistence`. The local dev UI
//! uses it to keep polled run history across restarts; items are stored as
//! JSON rows keyed by `(run_id, event_id)` so snapshot re-delivery upserts.

#[cfg(feature = "sqlite-persistence")]
use std::path::{Path, PathBuf};
#[cfg(feature = "sqlite-persistence")]
use std::sync::Mutex;
#[cfg(feature = "sqlite-persistence")]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "sqlite-persistence")]
use rusqlite::{params, Connection, OptionalExtension};

#[cfg(feature = "sqlite-persistence")]
use crate::history::identity::{EventId, RunId};
#[cfg(feature = "sqlite-persistence")]
use crate::history::raw::{HistoryError, HistoryStore, RawHistoryItem};

#[cfg(feature = "sqlite-persistence")]
fn map_store_err(prefix: &str, err: impl std::fmt::Display) -> HistoryError {
    HistoryError::Store(format!("{prefix}: {err}"))
}

#[cfg(feature = "sqlite-persistence")]
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// SQLite-backed history item log.
#[cfg(feature = "sqlite-persistence")]
pub struct SqliteHistoryStore {
    db_path: PathBuf,
    lock: Mutex<()>,
}

#[cfg(feature = "sqlite-persistence")]
impl SqliteHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn open_connection(&self) -> Result<Connection, HistoryError> {
        if let Some(parent) = Path::new(&self.db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| map_store_err("create parent dir", e))?;
        }
        let conn =
            Connection::open(&self.db_path).map_err(|e| map_store_err("open sqlite db", e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| map_store_err("set journal_mode", e))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| map_store_err("set synchronous", e))?;
        self.ensure_schema(&conn)?;
        Ok(conn)
    }

    fn ensure_schema(&self, conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS run_history (
                run_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                item_json TEXT NOT NULL,
                stored_at_ms INTEGER NOT NULL,
                PRIMARY KEY (run_id, event_id)
            );
            CREATE INDEX IF NOT EXISTS idx_run_history_run_event
            ON run_history (run_id, event_id);
            ",
        )
        .map_err(|e| map_store_err("ensure schema", e))?;
        Ok(())
    }
}

#[cfg(feature = "sqlite-persistence")]
impl HistoryStore for SqliteHistoryStore {
    fn append(&self, run_id: &RunId, items: &[RawHistoryItem]) -> Result<(), HistoryError> {
        if items.is_empty() {
            return Ok(());
        }
        let _guard = self
            .lock
            .lock()
            .map_err(|_| map_store_err("lock poisoned", "mutex poisoned"))?;
        let mut conn = self.open_connection()?;

        let tx = conn
            .transaction()
            .map_err(|e| map_store_err("begin tx", e))?;
        for item in items {
            let json =
                serde_json::to_string(item).map_err(|e| map_store_err("serialize item", e))?;
            tx.execute(
                "INSERT INTO run_history (run_id, event_id, item_json, stored_at_ms)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (run_id, event_id)
                 DO UPDATE SET item_json = excluded.item_json, stored_at_ms = excluded.stored_at_ms",
                params![run_id, item.id, json, now_ms()],
            )
            .map_err(|e| map_store_err("insert item", e))?;
        }
        tx.commit().map_err(|e| map_store_err("commit tx", e))?;
        Ok(())
    }

    fn scan(&self, run_id: &RunId, from: &str) -> Result<Vec<RawHistoryItem>, HistoryError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| map_store_err("lock poisoned", "mutex poisoned"))?;
        let conn = self.open_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT event_id, item_json FROM run_history
                 WHERE run_id = ?1 AND event_id >= ?2
                 ORDER BY event_id ASC",
            )
            .map_err(|e| map_store_err("prepare scan", e))?;
        let rows = stmt
            .query_map(params![run_id, from], |row| {
                let event_id: String = row.get(0)?;
                let json: String = row.get(1)?;
                Ok((event_id, json))
            })
            .map_err(|e| map_store_err("query scan", e))?;

        // One undecodable row degrades the view instead of blanking it.
        let mut out = Vec::new();
        for row in rows {
            let (event_id, json) = row.map_err(|e| map_store_err("row read", e))?;
            match serde_json::from_str::<RawHistoryItem>(&json) {
                Ok(item) => out.push(item),
                Err(err) => {
                    tracing::debug!(%event_id, %err, "skipping undecodable history row");
                }
            }
        }
        Ok(out)
    }

    fn head(&self, run_id: &RunId) -> Result<Option<EventId>, HistoryError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| map_store_err("lock poisoned", "mutex poisoned"))?;
        let conn = self.open_connection()?;
        let head: Option<String> = conn
            .query_row(
                "SELECT MAX(event_id) FROM run_history WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| map_store_err("read head", e))?
            .flatten();
        Ok(head)
    }
}
