use meli_sales_engine::{
    db_types::{
        NewNotification,
        Notification,
        NotificationPage,
        NotificationQuery,
        NotificationStatistics,
        NotificationUpdate,
    },
    NotificationManagement,
    NotificationStoreError,
};
use mockall::mock;

mock! {
    pub NotificationJournal {}
    impl NotificationManagement for NotificationJournal {
        async fn store_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError>;
        async fn fetch_notification(&self, notification_id: &str) -> Result<Option<Notification>, NotificationStoreError>;
        async fn update_notification(&self, notification_id: &str, update: NotificationUpdate) -> Result<Option<Notification>, NotificationStoreError>;
        async fn fetch_unprocessed_notifications(&self, limit: i64) -> Result<Vec<Notification>, NotificationStoreError>;
        async fn search_notifications(&self, query: NotificationQuery) -> Result<NotificationPage, NotificationStoreError>;
        async fn notification_statistics(&self) -> Result<NotificationStatistics, NotificationStoreError>;
    }
}
