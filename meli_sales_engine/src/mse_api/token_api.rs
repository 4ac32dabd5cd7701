//! Credential lookup for the marketplace REST client.

use std::sync::Arc;

use log::*;
use mercado_tools::{MercadoApiError, TokenInfo, TokenProvider};
use msp_common::Secret;
use tokio::sync::Mutex;

use crate::traits::{AccountsError, MarketplaceAccounts};

#[derive(Debug, Clone)]
struct CachedCredentials {
    access_token: String,
    user_id: Option<String>,
}

/// `TokenApi` resolves the active seller account's access token and user id, caching the result in
/// memory so the REST client does not hit the database on every request attempt. Operators rotate
/// tokens by updating the account row and clearing the cache (or restarting the process).
pub struct TokenApi<B> {
    db: B,
    cache: Arc<Mutex<Option<CachedCredentials>>>,
}

impl<B: Clone> Clone for TokenApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), cache: Arc::clone(&self.cache) }
    }
}

impl<B> TokenApi<B>
where B: MarketplaceAccounts
{
    pub fn new(db: B) -> Self {
        Self { db, cache: Arc::new(Mutex::new(None)) }
    }

    async fn credentials(&self) -> Result<CachedCredentials, AccountsError> {
        let mut cache = self.cache.lock().await;
        if let Some(creds) = cache.as_ref() {
            return Ok(creds.clone());
        }
        let account = self.db.fetch_active_account().await?;
        let access_token = account.access_token.clone().ok_or(AccountsError::NoAccessToken(account.name.clone()))?;
        debug!("🔐️ Loaded credentials for account '{}' (user id: {:?})", account.name, account.marketplace_user_id);
        let creds = CachedCredentials { access_token, user_id: account.marketplace_user_id };
        *cache = Some(creds.clone());
        Ok(creds)
    }
}

impl<B> TokenProvider for TokenApi<B>
where B: MarketplaceAccounts + Clone + Send + Sync + 'static
{
    async fn access_token(&self) -> Result<String, MercadoApiError> {
        self.credentials()
            .await
            .map(|creds| creds.access_token)
            .map_err(|e| MercadoApiError::TokenUnavailable(e.to_string()))
    }

    async fn user_id(&self) -> Option<String> {
        self.credentials().await.ok().and_then(|creds| creds.user_id)
    }

    async fn token_info(&self) -> Option<TokenInfo> {
        self.credentials()
            .await
            .ok()
            .map(|creds| TokenInfo { access_token: Secret::new(creds.access_token), user_id: creds.user_id })
    }

    async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        if cache.take().is_some() {
            info!("🔐️ Credential cache cleared. The next API call re-reads the account store");
        }
    }
}
