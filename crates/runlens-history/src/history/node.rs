//! Derived step state: one [HistoryNode] per step group.
//!
//! Nodes are owned and mutated only by the fold; consumers treat the derived
//! map as read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::identity::GroupId;
use crate::history::raw::{OutputRef, SleepConfig, WaitConfig};

/// Current status of a step group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Scheduled,
    Started,
    Completed,
    Failed,
    /// Retryable error, as opposed to the terminal `Failed`.
    Errored,
    Cancelled,
    Sleeping,
    Waiting,
}

impl NodeStatus {
    /// True once the step can no longer make progress.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Cancelled
        )
    }

    /// True for the statuses a run-level cancellation sweeps up.
    ///
    /// `Errored` is excluded: the retry outcome is already decided by later
    /// step items, not by the cancellation.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            NodeStatus::Scheduled | NodeStatus::Started | NodeStatus::Sleeping | NodeStatus::Waiting
        )
    }
}

/// Derived state of one step group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryNode {
    /// Key matching the items this node was built from.
    pub group_id: GroupId,
    pub status: NodeStatus,
    /// Latest attempt number observed for this group.
    pub attempt: u32,
    /// Display name from the first item that carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Present only while status is `Sleeping`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepConfig>,
    /// Present only while status is `Waiting`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitConfig>,
    /// Small handle to the output or error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputRef>,
}

impl HistoryNode {
    /// Creates a fresh node for a group, before any item has been applied.
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            status: NodeStatus::Scheduled,
            attempt: 0,
            step_name: None,
            scheduled_at: None,
            started_at: None,
            ended_at: None,
            sleep: None,
            wait: None,
            output: None,
        }
    }

    /// Sets the status and drops sleep/wait config that no longer applies.
    ///
    /// Invariant: `sleep` is Some only while `Sleeping`, `wait` only while
    /// `Waiting`.
    pub(crate) fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
        if status != NodeStatus::Sleeping {
            self.sleep = None;
        }
        if status != NodeStatus::Waiting {
            self.wait = None;
        }
    }
}
