//! `SqliteDatabase` is a concrete storage backend for the sales reconciliation engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{accounts, db_url, new_pool, notifications, sales};
use crate::{
    db_types::{
        MarketplaceAccount,
        NewNotification,
        NewSaleRecord,
        Notification,
        NotificationPage,
        NotificationQuery,
        NotificationStatistics,
        NotificationUpdate,
        SaleRecord,
    },
    traits::{
        AccountsError,
        MarketplaceAccounts,
        NotificationManagement,
        NotificationStoreError,
        SalesLedger,
        SalesLedgerError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn store_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let stored = notifications::store_notification(notification, &mut conn).await?;
        Ok(stored)
    }

    async fn fetch_notification(&self, notification_id: &str) -> Result<Option<Notification>, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::fetch_notification_by_notification_id(notification_id, &mut conn).await?;
        Ok(notification)
    }

    async fn update_notification(
        &self,
        notification_id: &str,
        update: NotificationUpdate,
    ) -> Result<Option<Notification>, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let updated = notifications::update_notification(notification_id, update, &mut conn).await?;
        Ok(updated)
    }

    async fn fetch_unprocessed_notifications(&self, limit: i64) -> Result<Vec<Notification>, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let pending = notifications::fetch_unprocessed_notifications(limit, &mut conn).await?;
        Ok(pending)
    }

    async fn search_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<NotificationPage, NotificationStoreError> {
        if query.limit.unwrap_or(0) < 0 || query.offset.unwrap_or(0) < 0 {
            return Err(NotificationStoreError::QueryError("limit and offset must not be negative".to_string()));
        }
        let mut conn = self.pool.acquire().await?;
        let page = notifications::search_notifications(query, &mut conn).await?;
        Ok(page)
    }

    async fn notification_statistics(&self) -> Result<NotificationStatistics, NotificationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let stats = notifications::notification_statistics(&mut conn).await?;
        Ok(stats)
    }
}

impl SalesLedger for SqliteDatabase {
    /// The existence check and the subsequent write run in a single transaction, so that reconciling the same order
    /// concurrently cannot produce duplicate rows.
    async fn upsert_sale_record(&self, record: NewSaleRecord) -> Result<SaleRecord, SalesLedgerError> {
        let mut tx = self.pool.begin().await?;
        let (stored, inserted) = sales::upsert_sale_record(record, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            trace!("🧾️ New ledger row {} committed", stored.id);
        }
        Ok(stored)
    }

    async fn fetch_sale_records_for_order(&self, order_id: i64) -> Result<Vec<SaleRecord>, SalesLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let records = sales::fetch_sale_records_for_order(order_id, &mut conn).await?;
        Ok(records)
    }

    async fn fetch_sale_records_for_pack(&self, pack_id: &str) -> Result<Vec<SaleRecord>, SalesLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let records = sales::fetch_sale_records_for_pack(pack_id, &mut conn).await?;
        Ok(records)
    }
}

impl MarketplaceAccounts for SqliteDatabase {
    async fn fetch_active_account(&self) -> Result<MarketplaceAccount, AccountsError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_active_account(&mut conn).await?;
        account.ok_or(AccountsError::NoActiveAccount)
    }
}
