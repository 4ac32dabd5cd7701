//! Dual-source recovery of notifications the push channel lost.
//!
//! The queue is in-memory, so anything in flight when the process dies is gone. Two sweeps make up for that:
//! polling the marketplace's missed-feeds endpoint for deliveries that never arrived, and re-queueing
//! notifications that made it into the journal but were never reconciled. Both funnel into the same
//! [`RetryQueue`](crate::queue::RetryQueue) as normal tasks, tagged with their origin so the statistics
//! distinguish them from live traffic.

use log::*;
use mercado_tools::{order_id_from_resource, MissedFeedItem, TokenProvider};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::NewNotification,
    mse_api::errors::RecoveryError,
    queue::{RetryQueue, TaskOrigin, TaskSpec},
    traits::{NotificationManagement, OrderSource},
};

/// How many unprocessed journal entries one reprocessing sweep will pick up.
pub const DEFAULT_SCAN_LIMIT: i64 = 100;

//--------------------------------------   RecoveryOutcome  ----------------------------------------------------------

/// Tally of one missed-feeds sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecoveryOutcome {
    /// Entries the missed-feeds endpoint reported.
    pub total: usize,
    /// Entries that were stored and queued for reconciliation.
    pub processed: usize,
    /// Entries that could not be stored or queued.
    pub errors: usize,
}

/// Tally of one unprocessed-notification sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReprocessOutcome {
    /// Unprocessed journal entries the sweep examined.
    pub total: usize,
    /// Entries queued for another reconciliation attempt.
    pub reprocessed: usize,
}

//--------------------------------------   RecoveryApi  --------------------------------------------------------------

pub struct RecoveryApi<B, S, T> {
    db: B,
    source: S,
    tokens: T,
    queue: RetryQueue,
    app_id: Option<String>,
    scan_limit: i64,
}

impl<B: Clone, S: Clone, T: Clone> Clone for RecoveryApi<B, S, T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            source: self.source.clone(),
            tokens: self.tokens.clone(),
            queue: self.queue.clone(),
            app_id: self.app_id.clone(),
            scan_limit: self.scan_limit,
        }
    }
}

impl<B, S, T> RecoveryApi<B, S, T>
where
    B: NotificationManagement,
    S: OrderSource,
    T: TokenProvider,
{
    pub fn new(db: B, source: S, tokens: T, queue: RetryQueue, app_id: Option<String>) -> Self {
        Self { db, source, tokens, queue, app_id, scan_limit: DEFAULT_SCAN_LIMIT }
    }

    pub fn with_scan_limit(mut self, limit: i64) -> Self {
        self.scan_limit = limit;
        self
    }

    /// Polls the missed-feeds endpoint and funnels order-related entries into the retry queue.
    ///
    /// A failed poll is logged and reported as an empty sweep rather than an error, since the next scheduled run
    /// will try again. Missing configuration (application id, or no authenticated account to derive the user id
    /// from) is an error: a sweep that can never reach the endpoint should be visible, not a silent zero.
    pub async fn recover_missed_feeds(&self) -> Result<RecoveryOutcome, RecoveryError> {
        let app_id = self
            .app_id
            .clone()
            .ok_or_else(|| RecoveryError::NotConfigured("the marketplace application id is not set".to_string()))?;
        let user_id = self
            .tokens
            .user_id()
            .await
            .ok_or_else(|| RecoveryError::NotConfigured("no marketplace user id is available".to_string()))?;
        let feed = match self.source.fetch_missed_feeds(&app_id, &user_id).await {
            Ok(feed) => feed,
            Err(e) => {
                error!("📥️ Missed-feeds poll failed: {e}");
                return Ok(RecoveryOutcome::default());
            },
        };
        if feed.is_empty() {
            info!("📥️ The marketplace reports no missed feeds.");
            return Ok(RecoveryOutcome::default());
        }
        info!("📥️ {} missed feed entries reported. Reconciling them against the journal.", feed.len());
        let mut outcome = RecoveryOutcome { total: feed.len(), ..RecoveryOutcome::default() };
        for entry in feed {
            match self.recover_one(entry).await {
                Ok(true) => outcome.processed += 1,
                Ok(false) => {},
                Err(e) => {
                    warn!("📥️ A missed feed entry could not be recovered: {e}");
                    outcome.errors += 1;
                },
            }
        }
        info!(
            "📥️ Missed-feed sweep complete. {} reported, {} queued, {} error(s).",
            outcome.total, outcome.processed, outcome.errors
        );
        Ok(outcome)
    }

    /// Stores one recovered feed entry and queues it when it refers to an order.
    ///
    /// Returns whether a task was queued. Entries the live path already reconciled are skipped outright, so the
    /// journal merge cannot flip them back to unprocessed.
    async fn recover_one(&self, entry: MissedFeedItem) -> Result<bool, RecoveryError> {
        let notification = NewNotification::from_feed(&entry);
        let notification_id = notification.notification_id.clone();
        if let Some(existing) = self.db.fetch_notification(&notification_id).await? {
            if existing.processed {
                debug!("📥️ Feed entry {notification_id} was already reconciled by the live path. Skipping.");
                return Ok(false);
            }
        }
        let order_task = entry.is_order_related().then(|| entry.resource.as_deref().and_then(order_id_from_resource));
        self.db.store_notification(notification).await?;
        match order_task {
            Some(Some(order_id)) => {
                let task = self.queue.enqueue(
                    TaskSpec::order(order_id).with_notification(&notification_id).with_origin(TaskOrigin::Recovery),
                );
                debug!("📥️ Queued task {} to reconcile recovered notification {notification_id}.", task.id);
                Ok(true)
            },
            Some(None) => {
                warn!("📥️ Feed entry {notification_id} looks order-related but its resource path is unusable.");
                Ok(false)
            },
            None => {
                debug!(
                    "📥️ Feed entry {notification_id} (topic {:?}) is not order-related. Stored without queueing.",
                    entry.topic
                );
                Ok(false)
            },
        }
    }

    /// Scans the journal for stored-but-unprocessed order notifications and queues them again.
    ///
    /// This is the backstop for tasks that exhausted their retry budget or were lost in a restart. The scan is
    /// capped at the configured limit per sweep; anything beyond the cap is picked up by later runs.
    pub async fn reprocess_unprocessed(&self) -> Result<ReprocessOutcome, RecoveryError> {
        let pending = self.db.fetch_unprocessed_notifications(self.scan_limit).await?;
        if pending.is_empty() {
            info!("🔁️ No unprocessed notifications in the journal.");
            return Ok(ReprocessOutcome::default());
        }
        info!("🔁️ {} unprocessed notification(s) found. Queueing them for another attempt.", pending.len());
        let mut outcome = ReprocessOutcome { total: pending.len(), ..ReprocessOutcome::default() };
        for notification in pending {
            let Some(order_id) = notification.resource.as_deref().and_then(order_id_from_resource) else {
                warn!(
                    "🔁️ Notification {} has no usable order resource. Leaving it unprocessed.",
                    notification.notification_id
                );
                continue;
            };
            let task = self.queue.enqueue(
                TaskSpec::order(order_id)
                    .with_notification(&notification.notification_id)
                    .with_origin(TaskOrigin::Reprocess),
            );
            debug!("🔁️ Queued task {} for notification {}.", task.id, notification.notification_id);
            outcome.reprocessed += 1;
        }
        info!("🔁️ Reprocessing sweep queued {} of {} notification(s).", outcome.reprocessed, outcome.total);
        Ok(outcome)
    }
}
