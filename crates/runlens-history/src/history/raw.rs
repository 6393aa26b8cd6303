//! Raw history items and the HistoryStore trait.
//!
//! History items are the source of truth. All step state is derived by folding
//! items in id order (see [crate::history::fold]).
//! Constraints: the log is append-only per run; scan returns items ordered by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::identity::{EventId, GroupId, RunId};

/// Discriminator for a history item.
///
/// `Unknown` absorbs kinds this crate does not know yet, so a newer backend
/// never breaks deserialization; the fold ignores them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryType {
    FunctionScheduled,
    FunctionStarted,
    FunctionCompleted,
    FunctionFailed,
    FunctionCancelled,
    StepScheduled,
    StepStarted,
    StepCompleted,
    StepFailed,
    /// Retryable step error, distinct from the terminal `StepFailed`.
    StepErrored,
    StepSleeping,
    StepWaiting,
    #[serde(other)]
    Unknown,
}

impl HistoryType {
    /// True for the kinds that fold into a step node.
    pub fn is_step(self) -> bool {
        matches!(
            self,
            HistoryType::StepScheduled
                | HistoryType::StepStarted
                | HistoryType::StepCompleted
                | HistoryType::StepFailed
                | HistoryType::StepErrored
                | HistoryType::StepSleeping
                | HistoryType::StepWaiting
        )
    }
}

/// Sleep payload: when the step wakes up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepConfig {
    pub until: DateTime<Utc>,
}

/// Wait-for-event payload: which event the step is blocked on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    pub event_name: String,
    /// Optional match expression evaluated against incoming events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// When the wait gives up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DateTime<Utc>>,
}

/// Opaque reference to a step's output or error payload.
///
/// Kept small: the full payload stays in the data layer and is fetched lazily
/// by whoever renders it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Identifier the data layer resolves to the full payload.
    pub data_id: String,
    /// Optional payload size hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// One raw history item: an immutable, timestamped record of a step or run
/// state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHistoryItem {
    /// Ordering key; the fold processes items in ascending id order.
    pub id: EventId,
    /// Item kind.
    #[serde(rename = "type")]
    pub kind: HistoryType,
    /// Step group this item belongs to; absent on run-lifecycle items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    /// Display name of the step, when the backend attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    /// Zero-based retry counter.
    #[serde(default)]
    pub attempt: u32,
    /// When the transition occurred.
    pub created_at: DateTime<Utc>,
    /// Sleep payload (`StepSleeping`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepConfig>,
    /// Wait payload (`StepWaiting`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitConfig>,
    /// Output or error reference (`StepCompleted` / `StepFailed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OutputRef>,
}

/// Scan lower bound meaning "from the beginning of the log".
///
/// Every assigned EventId is non-empty, so the empty string sorts before all
/// of them.
pub const FROM_START: &str = "";

/// History store: append-only item log per run.
///
/// **Constraints (must hold in all implementations and tests):**
/// - `append`: an item whose id is already in the log replaces the stored item
///   (full-snapshot polling re-delivers the entire log each tick).
/// - `scan(run_id, from)` returns items with `id >= from` in **ascending id
///   order**.
pub trait HistoryStore: Send + Sync {
    /// Appends items for the given run, replacing any stored item with the
    /// same id.
    fn append(&self, run_id: &RunId, items: &[RawHistoryItem]) -> Result<(), HistoryError>;

    /// Scans items for the run with `id >= from`, in ascending id order.
    fn scan(&self, run_id: &RunId, from: &str) -> Result<Vec<RawHistoryItem>, HistoryError>;

    /// Returns the highest item id for the run (None if the log is empty).
    fn head(&self, run_id: &RunId) -> Result<Option<EventId>, HistoryError>;
}

/// History-level error type.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("HistoryStore error: {0}")]
    Store(String),
    #[error("Decode error: {0}")]
    Decode(String),
}
