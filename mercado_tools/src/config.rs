use log::*;

pub const DEFAULT_MELI_API_URL: &str = "https://api.mercadolibre.com";
pub const DEFAULT_MELI_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MELI_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MELI_RETRY_DELAY_MS: u64 = 2_000;

/// Connection and retry settings for the Mercado Livre REST client.
#[derive(Debug, Clone)]
pub struct MercadoConfig {
    /// Base URL of the marketplace API, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Number of attempts per logical call before the error is surfaced.
    pub max_retries: u32,
    /// Fixed pause between attempts. Deliberately not exponential.
    pub retry_delay_ms: u64,
    /// Marketplace application id. Required for the missed-feeds endpoint only.
    pub app_id: Option<String>,
}

impl Default for MercadoConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MELI_API_URL.to_string(),
            timeout_ms: DEFAULT_MELI_TIMEOUT_MS,
            max_retries: DEFAULT_MELI_MAX_RETRIES,
            retry_delay_ms: DEFAULT_MELI_RETRY_DELAY_MS,
            app_id: None,
        }
    }
}

impl MercadoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("MELI_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ MELI_API_URL is not set, using {DEFAULT_MELI_API_URL}");
            DEFAULT_MELI_API_URL.to_string()
        });
        let timeout_ms = std::env::var("MELI_TIMEOUT_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or_else(|| {
            warn!("🪛️ MELI_TIMEOUT_MS is not set or invalid, using {DEFAULT_MELI_TIMEOUT_MS}ms");
            DEFAULT_MELI_TIMEOUT_MS
        });
        let max_retries =
            std::env::var("MELI_MAX_RETRIES").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or_else(|| {
                warn!("🪛️ MELI_MAX_RETRIES is not set or invalid, using {DEFAULT_MELI_MAX_RETRIES}");
                DEFAULT_MELI_MAX_RETRIES
            });
        let retry_delay_ms =
            std::env::var("MELI_RETRY_DELAY_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or_else(|| {
                warn!("🪛️ MELI_RETRY_DELAY_MS is not set or invalid, using {DEFAULT_MELI_RETRY_DELAY_MS}ms");
                DEFAULT_MELI_RETRY_DELAY_MS
            });
        let app_id = match std::env::var("MELI_APP_ID") {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => {
                warn!("🪛️ MELI_APP_ID is not set. Missed-feed recovery will be unavailable");
                None
            },
        };
        Self { api_url, timeout_ms, max_retries, retry_delay_ms, app_id }
    }
}
