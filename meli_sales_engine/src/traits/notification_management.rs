use thiserror::Error;

use crate::db_types::{
    NewNotification, Notification, NotificationPage, NotificationQuery, NotificationStatistics, NotificationUpdate,
};

#[derive(Debug, Clone, Error)]
pub enum NotificationStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for NotificationStoreError {
    fn from(e: sqlx::Error) -> Self {
        NotificationStoreError::DatabaseError(e.to_string())
    }
}

/// The `NotificationManagement` trait defines the webhook journal.
///
/// The journal is idempotent on the marketplace's notification id: storing a notification that already exists merges
/// the new delivery into the existing row (and re-opens it for processing) rather than inserting a duplicate.
/// Everything else is bookkeeping around the `processed` flag that the retry queue and the recovery scan maintain.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Stores a notification, merging into the existing row when the `notification_id` has been seen before.
    /// Returns the stored row.
    async fn store_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError>;

    /// Fetches a notification by the marketplace's notification id. Returns `None` when it has never been stored.
    async fn fetch_notification(&self, notification_id: &str) -> Result<Option<Notification>, NotificationStoreError>;

    /// Applies a partial update to the notification with the given id. Fields that are `None` in `update` are left
    /// untouched. Returns the updated row, or `None` when no such notification exists.
    async fn update_notification(
        &self,
        notification_id: &str,
        update: NotificationUpdate,
    ) -> Result<Option<Notification>, NotificationStoreError>;

    /// Fetches up to `limit` unprocessed order notifications, most recently received first.
    async fn fetch_unprocessed_notifications(&self, limit: i64) -> Result<Vec<Notification>, NotificationStoreError>;

    /// Lists notifications matching the query, most recently received first, along with the total match count.
    async fn search_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<NotificationPage, NotificationStoreError>;

    /// Aggregate counts over the whole journal.
    async fn notification_statistics(&self) -> Result<NotificationStatistics, NotificationStoreError>;
}
