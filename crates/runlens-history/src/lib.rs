//! # runlens-history
//!
//! Projects the append-only history event log of one durable-function run into
//! a queryable per-step state map and a display-ordered timeline.
//!
//! ## Overview
//!
//! - **Raw items** — [history::RawHistoryItem]: immutable, timestamped records
//!   of step and run state transitions, ordered by a lexically sortable id.
//! - **Fold** — [history::fold]: pure projection of an item slice onto one
//!   [history::HistoryNode] per step group. Recomputed from the full log on
//!   every refresh; no incremental patching.
//! - **Timeline** — [history::run_timeline]: folded nodes in display order plus
//!   the run-level outcome, serializable to JSON for UI/CLI consumers.
//! - **Stores** — [history::InMemoryHistoryStore] and, behind the
//!   `sqlite-persistence` feature, [history::SqliteHistoryStore].
//!
//! ## Example
//!
//! ```
//! use runlens_history::history::{fold, NodeStatus, RawHistoryItem};
//!
//! let items: Vec<RawHistoryItem> = serde_json::from_str(
//!     r#"[
//!         {"id": "01A", "type": "StepScheduled", "group_id": "g1",
//!          "created_at": "2024-05-01T00:00:00Z"},
//!         {"id": "01B", "type": "StepStarted", "group_id": "g1",
//!          "created_at": "2024-05-01T00:00:01Z"}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let nodes = fold(&items);
//! assert_eq!(nodes["g1"].status, NodeStatus::Started);
//! ```

pub mod history;

pub use history::{
    fold, run_timeline, HistoryError, HistoryNode, HistoryStore, HistoryType, NodeStatus,
    RawHistoryItem, RunTimeline,
};
