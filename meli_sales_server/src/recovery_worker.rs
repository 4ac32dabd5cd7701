use std::time::Duration;

use log::*;
use meli_sales_engine::RecoveryError;
use tokio::task::JoinHandle;

use crate::server::LiveRecoveryApi;

/// Starts the background recovery worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every sweep runs both recovery passes back to back: the missed-feeds poll against the marketplace, then the
/// reprocessing scan over stored-but-unprocessed notifications. The first sweep runs as soon as the worker
/// starts, so notifications missed during downtime are picked up without waiting a full interval.
pub fn start_recovery_worker(api: LiveRecoveryApi, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Recovery worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running missed-feed recovery sweep");
            match api.recover_missed_feeds().await {
                Ok(outcome) => {
                    if outcome.total > 0 {
                        info!(
                            "🕰️ Missed-feed sweep done. {} missed feed(s), {} queued, {} error(s)",
                            outcome.total, outcome.processed, outcome.errors
                        );
                    } else {
                        debug!("🕰️ Missed-feed sweep done. No missed feeds");
                    }
                },
                Err(RecoveryError::NotConfigured(reason)) => {
                    debug!("🕰️ Missed-feed sweep skipped. {reason}");
                },
                Err(e) => {
                    error!("🕰️ Error running the missed-feed recovery sweep: {e}");
                },
            }
            debug!("🕰️ Running reprocessing sweep");
            match api.reprocess_unprocessed().await {
                Ok(outcome) => {
                    if outcome.total > 0 {
                        info!(
                            "🕰️ Reprocessing sweep done. {} unprocessed notification(s), {} requeued",
                            outcome.total, outcome.reprocessed
                        );
                    } else {
                        debug!("🕰️ Reprocessing sweep done. Nothing pending");
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running the reprocessing sweep: {e}");
                },
            }
        }
    })
}
