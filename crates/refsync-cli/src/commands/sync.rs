//! Sync command - Push catalog items to the remote database
//!
//! Provides the `refsync sync` CLI command which:
//! 1. Loads configuration and opens the library file
//! 2. Builds the Notion adapter and the sync engine
//! 3. Processes the requested items as one batch, without debouncing
//! 4. Prints the batch report

use anyhow::{bail, Result};
use clap::Args;
use refsync_core::domain::ItemId;
use refsync_sync::BatchReport;
use serde_json::json;
use tracing::info;

use super::CommandContext;
use crate::output::{count_noun, format_duration, get_formatter, OutputFormatter};

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Catalog item keys to sync, in processing order
    #[arg(value_name = "ID", required_unless_present = "all", conflicts_with = "all")]
    pub ids: Vec<ItemId>,

    /// Sync every item in the library
    #[arg(long)]
    pub all: bool,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let connection = ctx.connect().await?;

        let ids = if self.all {
            connection.library.item_ids().await
        } else {
            self.ids.clone()
        };

        if ids.is_empty() {
            formatter.info("Library is empty, nothing to sync");
            return Ok(());
        }

        info!(count = ids.len(), library = %connection.library.path().display(), "Starting sync");
        let report = connection.engine.sync_now(&ids).await;

        if ctx.format.is_json() {
            formatter.print_json(&report_json(&report));
        } else {
            print_report(formatter.as_ref(), &report);
        }

        if let Some(failure) = &report.failure {
            bail!("Sync aborted at {}: {}", failure.item, failure.error);
        }
        Ok(())
    }
}

fn report_json(report: &BatchReport) -> serde_json::Value {
    let synced: Vec<_> = report
        .synced
        .iter()
        .map(|(item, outcome)| {
            json!({
                "item": item,
                "remote_id": outcome.id,
                "url": outcome.url,
            })
        })
        .collect();

    json!({
        "success": report.is_success(),
        "started_at": report.started_at.to_rfc3339(),
        "duration_ms": report.duration.as_millis() as u64,
        "synced": synced,
        "skipped": report.skipped,
        "failure": report.failure,
    })
}

fn print_report(formatter: &dyn OutputFormatter, report: &BatchReport) {
    if report.is_success() {
        formatter.success(&format!(
            "Synced {} in {}",
            count_noun(report.synced.len(), "item"),
            format_duration(report.duration)
        ));
    } else {
        formatter.warn(&format!(
            "Synced {} before the batch aborted",
            count_noun(report.synced.len(), "item")
        ));
    }

    for (item, outcome) in &report.synced {
        formatter.field(item.as_str(), &outcome.url);
    }

    if !report.skipped.is_empty() {
        let skipped: Vec<_> = report.skipped.iter().map(ItemId::as_str).collect();
        formatter.info(&format!(
            "Skipped {} not in the library: {}",
            count_noun(skipped.len(), "item"),
            skipped.join(", ")
        ));
    }

    if let Some(failure) = &report.failure {
        if !failure.unattempted.is_empty() {
            formatter.info(&format!(
                "Not attempted: {}",
                count_noun(failure.unattempted.len(), "item")
            ));
        }
    }
}
