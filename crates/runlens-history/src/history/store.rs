//! In-memory HistoryStore implementation.
//!
//! Append replaces items that share an id (snapshot re-delivery is a no-op);
//! scan returns items in ascending id order.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::history::identity::{EventId, RunId};
use crate::history::raw::{HistoryError, HistoryStore, RawHistoryItem};

/// In-memory history store: one item log per run, kept sorted by id.
pub struct InMemoryHistoryStore {
    /// run_id -> items in ascending id order
    logs: RwLock<HashMap<RunId, Vec<RawHistoryItem>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, run_id: &RunId, items: &[RawHistoryItem]) -> Result<(), HistoryError> {
        if items.is_empty() {
            return Ok(());
        }
        let mut logs = self
            .logs
            .write()
            .map_err(|e| HistoryError::Store(e.to_string()))?;
        let log = logs.entry(run_id.clone()).or_default();
        for item in items {
            match log.binary_search_by(|probe| probe.id.cmp(&item.id)) {
                Ok(pos) => log[pos] = item.clone(),
                Err(pos) => log.insert(pos, item.clone()),
            }
        }
        Ok(())
    }

    fn scan(&self, run_id: &RunId, from: &str) -> Result<Vec<RawHistoryItem>, HistoryError> {
        let logs = self
            .logs
            .read()
            .map_err(|e| HistoryError::Store(e.to_string()))?;
        let log = match logs.get(run_id) {
            Some(l) => l,
            None => return Ok(Vec::new()),
        };
        Ok(log
            .iter()
            .filter(|item| item.id.as_str() >= from)
            .cloned()
            .collect())
    }

    fn head(&self, run_id: &RunId) -> Result<Option<EventId>, HistoryError> {
        let logs = self
            .logs
            .read()
            .map_err(|e| HistoryError::Store(e.to_string()))?;
        Ok(logs
            .get(run_id)
            .and_then(|l| l.last())
            .map(|item| item.id.clone()))
    }
}

/// Shared history store: wraps `Arc<InMemoryHistoryStore>` so a poller and
/// viewers can share the same log.
pub struct SharedHistoryStore(pub std::sync::Arc<InMemoryHistoryStore>);

impl SharedHistoryStore {
    pub fn new() -> Self {
        Self(std::sync::Arc::new(InMemoryHistoryStore::new()))
    }
}

impl Default for SharedHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for SharedHistoryStore {
    fn append(&self, run_id: &RunId, items: &[RawHistoryItem]) -> Result<(), HistoryError> {
        self.0.append(run_id, items)
    }

    fn scan(&self, run_id: &RunId, from: &str) -> Result<Vec<RawHistoryItem>, HistoryError> {
        self.0.scan(run_id, from)
    }

    fn head(&self, run_id: &RunId) -> Result<Option<EventId>, HistoryError> {
        self.0.head(run_id)
    }
}
