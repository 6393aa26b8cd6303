use anyhow::{Context, Result};
use runlens_history::history::{stream_fingerprint, timeline_from_items, RawHistoryItem};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,runlens_history=debug")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "run_history.json".into());
    let run_id = std::env::var("RUNLENS_RUN_ID").unwrap_or_else(|_| "local".into());

    let raw = std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&raw).context("parse history array")?;
    // A malformed entry is dropped, not fatal; the fold degrades gracefully.
    let mut items: Vec<RawHistoryItem> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(%err, "skipping malformed history item");
                None
            }
        })
        .collect();
    // The fold trusts input order; the file may not be sorted.
    items.sort_by(|a, b| a.id.cmp(&b.id));

    let fingerprint: String = stream_fingerprint(&items)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    let timeline = timeline_from_items(&run_id, &items);
    tracing::info!(
        run_id = %timeline.run_id,
        items = items.len(),
        steps = timeline.steps.len(),
        %fingerprint,
        "folded run history"
    );

    println!("{}", serde_json::to_string_pretty(&timeline)?);
    Ok(())
}
