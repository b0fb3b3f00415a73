//! Background sweep of expired magic links

use super::magic_link::MagicLinkService;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Purge expired, unused credentials every `interval` until the task is
/// aborted.
///
/// The first sweep runs one full interval after start. A failed sweep is
/// logged and retried on the next tick.
pub fn spawn_purge_task(service: Arc<MagicLinkService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.purge_expired(Utc::now()).await {
                Ok(0) => {},
                Ok(purged) => tracing::info!(purged, "Expired magic links purged"),
                Err(e) => tracing::warn!(error = %e, "Magic link purge failed"),
            }
        }
    })
}
