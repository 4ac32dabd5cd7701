use std::future::Future;

use thiserror::Error;

use crate::db_types::MarketplaceAccount;

#[derive(Debug, Clone, Error)]
pub enum AccountsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No active marketplace account is configured")]
    NoActiveAccount,
    #[error("Marketplace account '{0}' has no access token")]
    NoAccessToken(String),
}

impl From<sqlx::Error> for AccountsError {
    fn from(e: sqlx::Error) -> Self {
        AccountsError::DatabaseError(e.to_string())
    }
}

/// Access to the seller accounts that hold marketplace API credentials.
///
/// Unlike the other storage traits, the returned futures must be `Send`: the token provider built on top of this
/// trait is handed to the retry queue dispatcher and the recovery worker, both of which run on spawned tasks.
pub trait MarketplaceAccounts {
    /// Fetches the active seller account. Errors with [`AccountsError::NoActiveAccount`] when none is configured.
    fn fetch_active_account(&self) -> impl Future<Output = Result<MarketplaceAccount, AccountsError>> + Send;
}
