//! Watch command - Run the debounced engine over a notification stream
//!
//! Reads change notifications as JSON lines from stdin, one per line:
//!
//! ```text
//! {"kind": "added", "items": ["ABCD2345", "EFGH6789"]}
//! {"kind": "modified", "items": ["ABCD2345"]}
//! ```
//!
//! Notifications feed the debounce queue; batches are synced after the quiet
//! period. On end of input the command waits for the queue to settle, so every
//! accepted change has been processed before it exits. Ctrl+C stops
//! immediately after the in-flight batch.

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Args;
use refsync_sync::ChangeNotification;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::CommandContext;
use crate::output::{count_noun, get_formatter};

/// Capacity of the stdin → notifier channel
const CHANNEL_CAPACITY: usize = 64;

/// Watch command
#[derive(Debug, Args)]
pub struct WatchCommand {}

impl WatchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let mut connection = ctx.connect().await?;
        let engine = &mut connection.engine;

        engine.start();
        let shutdown = engine.shutdown_token();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        // A pending stdin read must not hold up runtime shutdown
        std::thread::spawn(move || forward_lines(std::io::stdin().lock(), tx));

        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping after the current batch");
                interrupt.cancel();
            }
        });

        formatter.info(&format!(
            "Watching stdin for change notifications (debounce {}ms)",
            engine.settings().debounce.as_millis()
        ));

        let forwarded = engine.notifier().run(rx, shutdown.clone()).await;

        let interrupted = shutdown.is_cancelled();
        if !interrupted {
            engine.wait_settled().await;
        }
        connection.engine.shutdown().await;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "forwarded": forwarded,
                "interrupted": interrupted,
            }));
        } else {
            formatter.success(&format!(
                "Stopped after {}",
                count_noun(forwarded, "notification")
            ));
        }

        Ok(())
    }
}

/// Parses one input line; blank lines yield `None`
fn parse_notification(line: &str) -> Result<Option<ChangeNotification>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let notification = serde_json::from_str(line).context("Invalid change notification")?;
    Ok(Some(notification))
}

/// Sends every valid line to `tx` until EOF or the receiver closes
///
/// Runs outside the async runtime. Returns the number of notifications sent.
fn forward_lines<R: BufRead>(reader: R, tx: mpsc::Sender<ChangeNotification>) -> usize {
    let mut sent = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read notification stream");
                break;
            }
        };

        match parse_notification(&line) {
            Ok(Some(notification)) => {
                if tx.blocking_send(notification).is_err() {
                    break;
                }
                sent += 1;
            }
            Ok(None) => {}
            Err(e) => warn!(line = %line, "{e:#}"),
        }
    }

    sent
}
