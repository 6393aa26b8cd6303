//! Run history projection.
//!
//! Raw history items are the source of truth. All step state is derived by
//! folding items in id order; the fold is pure and the whole projection is
//! rebuilt from the full log on every refresh (no incremental patching).

pub mod fingerprint;
pub mod fold;
pub mod identity;
pub mod node;
pub mod raw;
#[cfg(feature = "sqlite-persistence")]
pub mod sqlite_store;
pub mod store;
pub mod timeline;

pub use fingerprint::{nodes_fingerprint, stream_fingerprint};
pub use fold::{apply, fold};
pub use identity::{EventId, GroupId, RunId};
pub use node::{HistoryNode, NodeStatus};
pub use raw::{
    HistoryError, HistoryStore, HistoryType, OutputRef, RawHistoryItem, SleepConfig, WaitConfig,
    FROM_START,
};
#[cfg(feature = "sqlite-persistence")]
pub use sqlite_store::SqliteHistoryStore;
pub use store::{InMemoryHistoryStore, SharedHistoryStore};
pub use timeline::{run_status, run_timeline, timeline_from_items, RunStatusSummary, RunTimeline};
