use mercado_tools::MercadoApiError;
use thiserror::Error;

use crate::{
    queue::TaskError,
    traits::{NotificationStoreError, SalesLedgerError},
};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Marketplace API error: {0}")]
    ApiError(#[from] MercadoApiError),
    #[error("Sales ledger error: {0}")]
    LedgerError(#[from] SalesLedgerError),
    #[error("Pack {0} has no member orders")]
    EmptyPack(String),
    #[error("Pack {pack_id} could not be fully collected: {detail}")]
    PackIncomplete { pack_id: String, detail: String },
}

impl From<ReconciliationError> for TaskError {
    fn from(err: ReconciliationError) -> Self {
        TaskError::new(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Marketplace API error: {0}")]
    ApiError(#[from] MercadoApiError),
    #[error("Notification store error: {0}")]
    StoreError(#[from] NotificationStoreError),
    #[error("Recovery is not configured: {0}")]
    NotConfigured(String),
}
