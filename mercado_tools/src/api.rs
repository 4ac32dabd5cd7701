use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::{
    config::MercadoConfig,
    data_objects::{Mediation, MercadoOrder, MissedFeedItem, OrderPayment, Pack, Shipment},
    MercadoApiError,
    TokenProvider,
};

/// Read-only client for the Mercado Livre order APIs.
///
/// Every logical call is attempted up to `max_retries` times with a fixed pause between attempts;
/// a fresh access token is obtained from the [`TokenProvider`] on each attempt so that long retry
/// sequences survive token rotation. Only HTTP 429 and 5xx responses are retried.
#[derive(Clone)]
pub struct MercadoApi<T: TokenProvider> {
    config: MercadoConfig,
    client: Arc<Client>,
    tokens: T,
}

impl<T: TokenProvider> MercadoApi<T> {
    pub fn new(config: MercadoConfig, tokens: T) -> Result<Self, MercadoApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| MercadoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), tokens })
    }

    pub fn config(&self) -> &MercadoConfig {
        &self.config
    }

    pub fn token_provider(&self) -> &T {
        &self.tokens
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_get<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<R, MercadoApiError> {
        let url = self.url(path);
        let max_attempts = self.config.max_retries.max(1);
        let delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = self.tokens.access_token().await?;
            trace!("Sending REST query: {url} (attempt {attempt}/{max_attempts})");
            match self.try_get::<R>(&url, params, &token).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!("🌐️ {path} failed with a retryable error ({e}). Retrying in {}ms", delay.as_millis());
                    sleep(delay).await;
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get<R: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        token: &str,
    ) -> Result<R, MercadoApiError> {
        let mut req = self.client.get(url).bearer_auth(token);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await.map_err(|e| MercadoApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<R>().await.map_err(|e| MercadoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| MercadoApiError::RestResponseError(e.to_string()))?;
            // The marketplace wraps most failures in a JSON body with a `message` field.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            Err(MercadoApiError::UpstreamStatus { status, message })
        }
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<MercadoOrder, MercadoApiError> {
        self.rest_get(&format!("/orders/{order_id}"), &[]).await
    }

    pub async fn fetch_shipment(&self, shipment_id: &str) -> Result<Shipment, MercadoApiError> {
        self.rest_get(&format!("/shipments/{shipment_id}"), &[]).await
    }

    /// Payments hang off the `/collections` resource on this marketplace.
    pub async fn fetch_payment(&self, payment_id: &str) -> Result<OrderPayment, MercadoApiError> {
        self.rest_get(&format!("/collections/{payment_id}"), &[]).await
    }

    pub async fn fetch_pack(&self, pack_id: &str) -> Result<Pack, MercadoApiError> {
        self.rest_get(&format!("/packs/{pack_id}"), &[]).await
    }

    pub async fn fetch_mediation(&self, mediation_id: &str) -> Result<Mediation, MercadoApiError> {
        self.rest_get(&format!("/mediations/{mediation_id}"), &[]).await
    }

    /// Notifications the push channel failed to deliver for this application/user pair.
    pub async fn fetch_missed_feeds(
        &self,
        app_id: &str,
        user_id: &str,
    ) -> Result<Vec<MissedFeedItem>, MercadoApiError> {
        let raw: Vec<Value> =
            self.rest_get("/missed_feeds", &[("app_id", app_id), ("user_id", user_id)]).await?;
        Ok(raw.into_iter().map(MissedFeedItem::from_raw).collect())
    }
}
