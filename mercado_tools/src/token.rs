use std::future::Future;

use msp_common::Secret;

use crate::MercadoApiError;

/// A snapshot of the credentials the client is currently operating with.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: Secret<String>,
    pub user_id: Option<String>,
}

/// Source of bearer tokens for marketplace API calls.
///
/// The client asks for a fresh token on every request attempt, so implementations are expected to
/// cache aggressively and expose [`TokenProvider::clear_cache`] for operators. The futures must be
/// `Send` because API calls run inside spawned queue and recovery tasks.
pub trait TokenProvider: Clone + Send + Sync + 'static {
    /// The access token to present as the bearer credential.
    fn access_token(&self) -> impl Future<Output = Result<String, MercadoApiError>> + Send;

    /// The marketplace user id the token belongs to, when known.
    fn user_id(&self) -> impl Future<Output = Option<String>> + Send;

    /// Both credentials at once, or `None` when no usable token exists.
    fn token_info(&self) -> impl Future<Output = Option<TokenInfo>> + Send;

    /// Drops any cached token so the next call re-reads the backing store.
    fn clear_cache(&self) -> impl Future<Output = ()> + Send;
}
