//! Fold: projects raw history items onto per-group step state.
//!
//! Axiom: step state is the projection of the history log. The fold is
//! deterministic for a given input order; callers supply items sorted by id
//! (see [crate::history::raw::HistoryStore::scan]) and the fold applies them
//! as given, without re-sorting.

use std::collections::HashMap;

use crate::history::identity::GroupId;
use crate::history::node::{HistoryNode, NodeStatus};
use crate::history::raw::{HistoryType, RawHistoryItem};

/// Folds items in the given order into a map of group id to node.
///
/// Pure: no I/O, no clock, no randomness. The same input slice always
/// produces the same map. Items that cannot be applied (a step item without a
/// group id, a sleep/wait item without its payload) are skipped so one bad
/// record never blanks the whole view; unknown kinds are ignored. Empty input
/// yields an empty map.
pub fn fold(items: &[RawHistoryItem]) -> HashMap<GroupId, HistoryNode> {
    let mut nodes = HashMap::new();
    for item in items {
        apply(&mut nodes, item);
    }
    nodes
}

/// Applies one item to the map.
///
/// Later items for the same group override earlier ones unconditionally,
/// including status regressions from out-of-order delivery (a late
/// `StepStarted` after `StepCompleted` reverts the node to `Started`).
pub fn apply(nodes: &mut HashMap<GroupId, HistoryNode>, item: &RawHistoryItem) {
    match item.kind {
        HistoryType::StepScheduled => {
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Scheduled);
            node.attempt = item.attempt;
            if node.scheduled_at.is_none() {
                node.scheduled_at = Some(item.created_at);
            }
        }
        HistoryType::StepStarted => {
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Started);
            node.attempt = item.attempt;
            if node.started_at.is_none() {
                node.started_at = Some(item.created_at);
            }
        }
        HistoryType::StepCompleted => {
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Completed);
            node.ended_at = Some(item.created_at);
            node.output = item.result.clone();
        }
        HistoryType::StepFailed => {
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Failed);
            node.ended_at = Some(item.created_at);
            node.output = item.result.clone();
        }
        HistoryType::StepErrored => {
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Errored);
            node.attempt = item.attempt;
        }
        HistoryType::StepSleeping => {
            let sleep = match &item.sleep {
                Some(s) => s.clone(),
                None => {
                    tracing::debug!(id = %item.id, "skipping StepSleeping item without sleep payload");
                    return;
                }
            };
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Sleeping);
            node.sleep = Some(sleep);
        }
        HistoryType::StepWaiting => {
            let wait = match &item.wait {
                Some(w) => w.clone(),
                None => {
                    tracing::debug!(id = %item.id, "skipping StepWaiting item without wait payload");
                    return;
                }
            };
            let node = match step_node(nodes, item) {
                Some(n) => n,
                None => return,
            };
            node.set_status(NodeStatus::Waiting);
            node.wait = Some(wait);
        }
        HistoryType::FunctionCancelled => {
            for node in nodes.values_mut() {
                if node.status.is_cancellable() {
                    node.set_status(NodeStatus::Cancelled);
                    if node.ended_at.is_none() {
                        node.ended_at = Some(item.created_at);
                    }
                }
            }
        }
        // Remaining run-lifecycle kinds feed the run summary, not step nodes.
        HistoryType::FunctionScheduled
        | HistoryType::FunctionStarted
        | HistoryType::FunctionCompleted
        | HistoryType::FunctionFailed
        | HistoryType::Unknown => {}
    }
}

/// Looks up or creates the node for a step item; None if the item carries no
/// group id (malformed, skipped).
fn step_node<'a>(
    nodes: &'a mut HashMap<GroupId, HistoryNode>,
    item: &RawHistoryItem,
) -> Option<&'a mut HistoryNode> {
    let group_id = match &item.group_id {
        Some(g) => g,
        None => {
            tracing::debug!(id = %item.id, kind = ?item.kind, "skipping step item without group id");
            return None;
        }
    };
    let node = nodes
        .entry(group_id.clone())
        .or_insert_with(|| HistoryNode::new(group_id.clone()));
    if node.step_name.is_none() {
        node.step_name = item.step_name.clone();
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::raw::{OutputRef, SleepConfig, WaitConfig};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_521_600 + offset_secs, 0).unwrap()
    }

    fn item(id: &str, kind: HistoryType, group: Option<&str>, attempt: u32) -> RawHistoryItem {
        RawHistoryItem {
            id: id.into(),
            kind,
            group_id: group.map(Into::into),
            step_name: None,
            attempt,
            created_at: ts(0),
            sleep: None,
            wait: None,
            result: None,
        }
    }

    fn output(data_id: &str) -> OutputRef {
        OutputRef {
            data_id: data_id.into(),
            size_bytes: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(fold(&[]).is_empty());
    }

    #[test]
    fn fold_is_idempotent() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepStarted, Some("g1"), 0),
            item("01C", HistoryType::StepErrored, Some("g1"), 0),
            item("01D", HistoryType::StepStarted, Some("g1"), 1),
        ];
        assert_eq!(fold(&items), fold(&items));
    }

    #[test]
    fn reordering_unrelated_groups_yields_same_map() {
        let a1 = item("01A", HistoryType::StepScheduled, Some("ga"), 0);
        let a2 = item("01C", HistoryType::StepStarted, Some("ga"), 0);
        let b1 = item("01B", HistoryType::StepScheduled, Some("gb"), 0);
        let b2 = item("01D", HistoryType::StepStarted, Some("gb"), 0);

        let interleaved = vec![a1.clone(), b1.clone(), a2.clone(), b2.clone()];
        let swapped = vec![b1, a1, b2, a2];
        assert_eq!(fold(&interleaved), fold(&swapped));
    }

    #[test]
    fn one_node_per_distinct_group() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepStarted, Some("g1"), 0),
            item("01C", HistoryType::StepScheduled, Some("g2"), 0),
            item("01D", HistoryType::StepScheduled, Some("g3"), 0),
            item("01E", HistoryType::StepStarted, Some("g3"), 0),
        ];
        assert_eq!(fold(&items).len(), 3);
    }

    #[test]
    fn scheduled_started_completed_reaches_terminal_state() {
        let mut completed = item("01C", HistoryType::StepCompleted, Some("g1"), 0);
        completed.result = Some(output("out-x"));
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepStarted, Some("g1"), 0),
            completed,
        ];
        let nodes = fold(&items);
        let node = &nodes["g1"];
        assert_eq!(node.status, NodeStatus::Completed);
        assert_eq!(node.attempt, 0);
        assert_eq!(node.output, Some(output("out-x")));
        assert!(node.started_at.is_some());
        assert!(node.ended_at.is_some());
    }

    #[test]
    fn sleeping_step_carries_sleep_config() {
        let mut sleeping = item("01B", HistoryType::StepSleeping, Some("g2"), 0);
        sleeping.sleep = Some(SleepConfig { until: ts(3600) });
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g2"), 0),
            sleeping,
        ];
        let nodes = fold(&items);
        let node = &nodes["g2"];
        assert_eq!(node.status, NodeStatus::Sleeping);
        assert_eq!(node.sleep, Some(SleepConfig { until: ts(3600) }));
    }

    #[test]
    fn retried_step_keeps_latest_attempt() {
        let mut completed = item("01D", HistoryType::StepCompleted, Some("g3"), 1);
        completed.result = Some(output("out-y"));
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g3"), 0),
            item("01B", HistoryType::StepErrored, Some("g3"), 0),
            item("01C", HistoryType::StepStarted, Some("g3"), 1),
            completed,
        ];
        let nodes = fold(&items);
        let node = &nodes["g3"];
        assert_eq!(node.status, NodeStatus::Completed);
        assert_eq!(node.attempt, 1);
        assert_eq!(node.output, Some(output("out-y")));
    }

    #[test]
    fn cancellation_sweeps_non_terminal_groups() {
        let mut sleeping = item("01E", HistoryType::StepSleeping, Some("g-sleep"), 0);
        sleeping.sleep = Some(SleepConfig { until: ts(3600) });
        let mut waiting = item("01F", HistoryType::StepWaiting, Some("g-wait"), 0);
        waiting.wait = Some(WaitConfig {
            event_name: "app/user.signup".into(),
            expression: None,
            timeout: None,
        });
        let mut completed = item("01D", HistoryType::StepCompleted, Some("g-done"), 0);
        completed.result = Some(output("out"));

        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g-sched"), 0),
            item("01B", HistoryType::StepStarted, Some("g-run"), 0),
            item("01C", HistoryType::StepScheduled, Some("g-done"), 0),
            completed,
            sleeping,
            waiting,
            item("01G", HistoryType::FunctionCancelled, None, 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes["g-sched"].status, NodeStatus::Cancelled);
        assert_eq!(nodes["g-run"].status, NodeStatus::Cancelled);
        assert_eq!(nodes["g-sleep"].status, NodeStatus::Cancelled);
        assert_eq!(nodes["g-wait"].status, NodeStatus::Cancelled);
        assert_eq!(nodes["g-done"].status, NodeStatus::Completed);
        assert!(nodes["g-sleep"].sleep.is_none());
        assert!(nodes["g-wait"].wait.is_none());
        assert!(nodes["g-sched"].ended_at.is_some());
    }

    #[test]
    fn cancellation_leaves_errored_groups_alone() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepErrored, Some("g1"), 0),
            item("01C", HistoryType::FunctionCancelled, None, 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes["g1"].status, NodeStatus::Errored);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::Unknown, Some("g1"), 0),
            item("01C", HistoryType::StepStarted, Some("g1"), 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes["g1"].status, NodeStatus::Started);
    }

    #[test]
    fn step_item_without_group_id_is_skipped() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepStarted, None, 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes["g1"].status, NodeStatus::Scheduled);
    }

    #[test]
    fn sleeping_item_without_payload_is_skipped() {
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            item("01B", HistoryType::StepSleeping, Some("g1"), 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes["g1"].status, NodeStatus::Scheduled);
        assert!(nodes["g1"].sleep.is_none());
    }

    // Late-arriving items are applied as-is; a started item after completion
    // reverts the node. Matches upstream behavior for replayed logs.
    #[test]
    fn late_started_item_reverts_completed_node() {
        let mut completed = item("01B", HistoryType::StepCompleted, Some("g1"), 0);
        completed.result = Some(output("out"));
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            completed,
            item("01C", HistoryType::StepStarted, Some("g1"), 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes["g1"].status, NodeStatus::Started);
    }

    #[test]
    fn waking_from_sleep_clears_sleep_config() {
        let mut sleeping = item("01B", HistoryType::StepSleeping, Some("g1"), 0);
        sleeping.sleep = Some(SleepConfig { until: ts(60) });
        let items = vec![
            item("01A", HistoryType::StepScheduled, Some("g1"), 0),
            sleeping,
            item("01C", HistoryType::StepStarted, Some("g1"), 0),
        ];
        let nodes = fold(&items);
        assert_eq!(nodes["g1"].status, NodeStatus::Started);
        assert!(nodes["g1"].sleep.is_none());
    }

    #[test]
    fn first_step_name_wins() {
        let mut scheduled = item("01A", HistoryType::StepScheduled, Some("g1"), 0);
        scheduled.step_name = Some("load user".into());
        let mut started = item("01B", HistoryType::StepStarted, Some("g1"), 0);
        started.step_name = Some("renamed later".into());
        let nodes = fold(&[scheduled, started]);
        assert_eq!(nodes["g1"].step_name.as_deref(), Some("load user"));
    }
}
