use thiserror::Error;

use crate::db_types::{NewSaleRecord, SaleRecord};

#[derive(Debug, Clone, Error)]
pub enum SalesLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SalesLedgerError {
    fn from(e: sqlx::Error) -> Self {
        SalesLedgerError::DatabaseError(e.to_string())
    }
}

/// Write interface for the denormalised sales ledger.
///
/// The only mutating operation is an upsert keyed on the natural key `(record_type, pack_id, order_id, item_id)`.
/// NULL dimensions participate in the key (a `sale` row has no pack or item dimension, a `pack` row has no order or
/// item dimension), so the backend must match NULLs exactly rather than treating them as distinct. The check and the
/// write happen atomically.
#[allow(async_fn_in_trait)]
pub trait SalesLedger {
    /// Inserts the record, or updates the existing row carrying the same natural key. Every column except the key
    /// and `created_at` is overwritten on update. Returns the stored row.
    async fn upsert_sale_record(&self, record: NewSaleRecord) -> Result<SaleRecord, SalesLedgerError>;

    /// Fetches all ledger rows referencing the given order, oldest first.
    async fn fetch_sale_records_for_order(&self, order_id: i64) -> Result<Vec<SaleRecord>, SalesLedgerError>;

    /// Fetches all ledger rows referencing the given pack, oldest first.
    async fn fetch_sale_records_for_pack(&self, pack_id: &str) -> Result<Vec<SaleRecord>, SalesLedgerError>;
}
