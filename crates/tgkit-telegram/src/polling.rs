use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use tgkit_core::{
    transport::{requests::GetUpdates, send},
    Bot, RawUpdate,
};

/// Pause after a failed `getUpdates` so a dead network does not spin the loop.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Long-poll `getUpdates` and dispatch every entry until `shutdown` fires.
///
/// Entries that do not decode are logged and skipped; the offset still moves past them.
pub async fn run_polling(
    bot: Bot,
    timeout: Duration,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut offset: Option<i64> = None;
    tracing::info!(timeout_secs = timeout.as_secs(), "polling for updates");

    loop {
        let req = GetUpdates {
            offset,
            timeout: Some(timeout.as_secs()),
            allowed_updates: Vec::new(),
        };

        let batch = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            r = send(bot.transport().as_ref(), &req) => r,
        };

        match batch {
            Ok(entries) => {
                for entry in entries {
                    offset = next_offset(offset, &entry);
                    dispatch_entry(&bot, entry);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                }
            }
        }
    }

    tracing::info!("polling stopped");
    Ok(())
}

fn next_offset(current: Option<i64>, entry: &Value) -> Option<i64> {
    match entry.get("update_id").and_then(Value::as_i64) {
        Some(id) => Some(current.map_or(id + 1, |o| o.max(id + 1))),
        None => current,
    }
}

fn dispatch_entry(bot: &Bot, entry: Value) {
    let raw: RawUpdate = match serde_json::from_value(entry) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable update");
            return;
        }
    };
    // NotConfigured is logged by the dispatcher.
    let _ = bot.dispatcher().dispatch_raw(raw);
}
