//! The production queue handler. Wires the reconciliation engine to the SQLite journal.

use log::*;

use crate::{
    db_types::NotificationUpdate,
    mse_api::reconciler_api::ReconcilerApi,
    queue::{QueueTask, TaskError, TaskHandler, TaskKind, TaskOutcome},
    sqlite::SqliteDatabase,
    traits::{NotificationManagement, OrderSource},
};

/// Runs queue tasks against the reconciliation engine and books their outcomes into the notification journal.
///
/// Generic over the order source so that integration tests can drive whole queue flows with a scripted source
/// while still using the real database.
pub struct LiveTaskHandler<S: OrderSource> {
    db: SqliteDatabase,
    reconciler: ReconcilerApi<SqliteDatabase, S>,
}

impl<S: OrderSource> Clone for LiveTaskHandler<S> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), reconciler: self.reconciler.clone() }
    }
}

impl<S: OrderSource> LiveTaskHandler<S> {
    pub fn new(db: SqliteDatabase, reconciler: ReconcilerApi<SqliteDatabase, S>) -> Self {
        Self { db, reconciler }
    }
}

impl<S: OrderSource> TaskHandler for LiveTaskHandler<S> {
    async fn execute(&self, task: &QueueTask) -> Result<TaskOutcome, TaskError> {
        match task.kind {
            TaskKind::Order => self.reconciler.process_order(&task.target_id).await.map_err(TaskError::from),
            TaskKind::Pack => self.reconciler.process_pack(&task.target_id).await.map_err(TaskError::from),
        }
    }

    async fn record_success(&self, task: &QueueTask, outcome: &TaskOutcome) {
        let Some(notification_id) = task.notification_id.as_deref() else {
            return;
        };
        let response = serde_json::to_string(outcome).unwrap_or_else(|_| "{}".to_string());
        match self.db.update_notification(notification_id, NotificationUpdate::completed(response)).await {
            Ok(Some(_)) => debug!("📬️ Notification {notification_id} marked as processed."),
            Ok(None) => warn!("📬️ Task {} succeeded but notification {notification_id} is not in the journal.", task.id),
            Err(e) => error!("📬️ Could not mark notification {notification_id} as processed: {e}"),
        }
    }

    async fn record_failure(&self, task: &QueueTask, error: &TaskError) {
        let Some(notification_id) = task.notification_id.as_deref() else {
            return;
        };
        match self.db.update_notification(notification_id, NotificationUpdate::failed(error.to_string())).await {
            Ok(Some(_)) => debug!("📬️ Terminal failure recorded against notification {notification_id}."),
            Ok(None) => warn!("📬️ Task {} failed but notification {notification_id} is not in the journal.", task.id),
            Err(e) => error!("📬️ Could not record the failure of notification {notification_id}: {e}"),
        }
    }
}
