//! `coverdesk run` — process a JSON-lines file of inbound deliveries.
//!
//! Each line is one raw delivery. Malformed lines and validation failures
//! are logged and skipped; orchestration failures are logged and the file
//! keeps processing, the same way a live inbox would keep draining.

use std::path::Path;

use chrono::Utc;
use coverdesk_channels::RawInbound;
use coverdesk_config::AppConfig;
use coverdesk_core::store::ContextStore;
use tracing::{error, info, warn};

use super::{build_runtime, load_roster};

pub async fn run(
    config: &AppConfig,
    events: &Path,
    roster: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = load_roster(roster)?;
    let runtime = build_runtime(config, roster);

    let raw = std::fs::read_to_string(events)?;
    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let delivery: RawInbound = match serde_json::from_str(line) {
            Ok(d) => d,
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "Skipping unparseable line");
                skipped += 1;
                continue;
            }
        };

        let (message, event) = match runtime.adapter.ingest(&delivery) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "Rejected at validation");
                skipped += 1;
                continue;
            }
        };

        match runtime.orchestrator.handle(message, event).await {
            Ok(outcome) => {
                info!(
                    task_id = %outcome.task.id,
                    status = %outcome.task.status,
                    assignee = outcome.task.assignee.as_deref().unwrap_or("-"),
                    resumed = outcome.resumed,
                    "Processed"
                );
                processed += 1;
            }
            Err(e) => {
                error!(line = lineno + 1, error = %e, "Orchestration failed");
                failed += 1;
            }
        }
    }

    let status = runtime.store.status(Utc::now()).await?;
    info!(
        processed,
        skipped,
        failed,
        open_tasks = status.open_tasks,
        hot_messages = status.hot_messages,
        confirmed_dispatches = status.confirmed_dispatches,
        "Run complete"
    );

    Ok(())
}
