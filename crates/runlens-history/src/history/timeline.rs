//! Run timeline: display-ordered step states plus run outcome.
//!
//! Built from a HistoryStore or a raw item slice; can be serialized to JSON
//! for UI/CLI consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::fold::fold;
use crate::history::identity::{GroupId, RunId};
use crate::history::node::HistoryNode;
use crate::history::raw::{HistoryError, HistoryStore, HistoryType, RawHistoryItem, FROM_START};

/// Summary of run outcome, derived from run-lifecycle items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatusSummary {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Full timeline for a run: step nodes in display order and final status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunTimeline {
    pub run_id: RunId,
    pub steps: Vec<HistoryNode>,
    pub status: RunStatusSummary,
}

/// Derives the run-level status by scanning run-lifecycle items in order.
/// Step items never change the run status.
pub fn run_status(items: &[RawHistoryItem]) -> RunStatusSummary {
    let mut status = RunStatusSummary::Queued;
    for item in items {
        status = match item.kind {
            HistoryType::FunctionScheduled => RunStatusSummary::Queued,
            HistoryType::FunctionStarted => RunStatusSummary::Running,
            HistoryType::FunctionCompleted => RunStatusSummary::Completed,
            HistoryType::FunctionFailed => RunStatusSummary::Failed,
            HistoryType::FunctionCancelled => RunStatusSummary::Cancelled,
            _ => status,
        };
    }
    status
}

/// Builds a timeline from an item slice: fold, then order for display.
///
/// The fold map carries no order; display order is started_at, then
/// scheduled_at, then group id, so never-started steps sort by when they were
/// scheduled.
pub fn timeline_from_items(run_id: &RunId, items: &[RawHistoryItem]) -> RunTimeline {
    let nodes = fold(items);
    let mut steps: Vec<HistoryNode> = nodes.into_values().collect();
    steps.sort_by_key(display_key);
    RunTimeline {
        run_id: run_id.clone(),
        steps,
        status: run_status(items),
    }
}

/// Scans the store for the run and builds its timeline.
pub fn run_timeline(
    store: &dyn HistoryStore,
    run_id: &RunId,
) -> Result<RunTimeline, HistoryError> {
    let items = store.scan(run_id, FROM_START)?;
    Ok(timeline_from_items(run_id, &items))
}

fn display_key(node: &HistoryNode) -> (Option<DateTime<Utc>>, GroupId) {
    (
        node.started_at.or(node.scheduled_at),
        node.group_id.clone(),
    )
}
