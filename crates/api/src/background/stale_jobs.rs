//! Periodic requeue of samples whose job exceeded the runner timeout.
//!
//! Dispatch already requeues stale samples before every claim; this loop
//! keeps sample statuses accurate while no runner is polling.

use std::time::Duration;

use predictcr_db::repositories::JobRepo;
use predictcr_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Run the sweep every `interval` until `cancel` is triggered.
pub async fn run(pool: DbPool, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Stale job sweep started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale job sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match JobRepo::sweep_stale(&pool).await {
                    Ok(requeued) if !requeued.is_empty() => {
                        tracing::info!(count = requeued.len(), "Stale job sweep: requeued samples");
                    }
                    Ok(_) => tracing::debug!("Stale job sweep: nothing to requeue"),
                    Err(e) => tracing::error!(error = %e, "Stale job sweep failed"),
                }
            }
        }
    }
}
