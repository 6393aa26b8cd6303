//! Projection fingerprints: detect unchanged snapshots without deep comparison.
//!
//! A polling consumer re-fetches the full item log each tick; when the new
//! snapshot hashes (or folds) to the same value, the consumer can skip
//! re-rendering.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::history::identity::GroupId;
use crate::history::node::HistoryNode;
use crate::history::raw::RawHistoryItem;

/// Computes a SHA-256 hash of the item stream in the given order.
pub fn stream_fingerprint(items: &[RawHistoryItem]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for item in items {
        let canonical = serde_json::to_string(item).unwrap_or_default();
        hasher.update(canonical.as_bytes());
    }
    hasher.finalize().into()
}

/// Computes a SHA-256 hash of a folded map, nodes ordered by group id so the
/// map's iteration order never leaks into the hash.
pub fn nodes_fingerprint(nodes: &HashMap<GroupId, HistoryNode>) -> [u8; 32] {
    let mut ordered: Vec<&HistoryNode> = nodes.values().collect();
    ordered.sort_by(|a, b| a.group_id.cmp(&b.group_id));
    let mut hasher = Sha256::new();
    for node in ordered {
        let canonical = serde_json::to_string(node).unwrap_or_default();
        hasher.update(canonical.as_bytes());
    }
    hasher.finalize().into()
}
