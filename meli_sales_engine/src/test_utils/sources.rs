//! Scripted stand-ins for the marketplace API, so whole reconciliation flows run without network access.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use mercado_tools::{
    MercadoApiError,
    MercadoOrder,
    Mediation,
    MissedFeedItem,
    OrderPayment,
    Pack,
    Shipment,
    TokenInfo,
    TokenProvider,
};
use msp_common::Secret;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::traits::OrderSource;

#[derive(Debug, Clone)]
enum ScriptedResponse {
    Json(Value),
    Http(u16, String),
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<String, Vec<ScriptedResponse>>,
    calls: Vec<String>,
}

/// An [`OrderSource`] that replays scripted responses.
///
/// Responses are keyed by endpoint path, e.g. `orders/2000001234` or `packs/555`. Multiple responses scripted for
/// the same key are consumed in order, and the final one is sticky, so a script of `[500, 500, 200]` exercises the
/// retry path while a single `200` serves any number of calls. Unscripted keys answer 404, and every call is
/// recorded so tests can assert on fetch sequences.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOrderSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedOrderSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful JSON body for an endpoint key.
    pub fn respond_with(&self, key: &str, body: Value) -> &Self {
        self.push(key, ScriptedResponse::Json(body));
        self
    }

    /// Scripts an HTTP error status for an endpoint key.
    pub fn respond_with_status(&self, key: &str, status: u16, message: &str) -> &Self {
        self.push(key, ScriptedResponse::Http(status, message.to_string()));
        self
    }

    /// Every endpoint key fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// How many times the given endpoint key has been fetched.
    pub fn call_count(&self, key: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|call| *call == key).count()
    }

    fn push(&self, key: &str, response: ScriptedResponse) {
        let mut state = self.state.lock().unwrap();
        state.responses.entry(key.to_string()).or_default().push(response);
    }

    fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T, MercadoApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(key.to_string());
        let response = match state.responses.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => ScriptedResponse::Http(404, format!("{key} is not scripted")),
        };
        drop(state);
        match response {
            ScriptedResponse::Json(body) => {
                serde_json::from_value(body).map_err(|e| MercadoApiError::JsonError(e.to_string()))
            },
            ScriptedResponse::Http(status, message) => Err(MercadoApiError::UpstreamStatus { status, message }),
        }
    }
}

impl OrderSource for ScriptedOrderSource {
    async fn fetch_order(&self, order_id: &str) -> Result<MercadoOrder, MercadoApiError> {
        self.fetch(&format!("orders/{order_id}"))
    }

    async fn fetch_shipment(&self, shipment_id: &str) -> Result<Shipment, MercadoApiError> {
        self.fetch(&format!("shipments/{shipment_id}"))
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<OrderPayment, MercadoApiError> {
        self.fetch(&format!("collections/{payment_id}"))
    }

    async fn fetch_pack(&self, pack_id: &str) -> Result<Pack, MercadoApiError> {
        self.fetch(&format!("packs/{pack_id}"))
    }

    async fn fetch_mediation(&self, mediation_id: &str) -> Result<Mediation, MercadoApiError> {
        self.fetch(&format!("mediations/{mediation_id}"))
    }

    async fn fetch_missed_feeds(&self, _app_id: &str, _user_id: &str) -> Result<Vec<MissedFeedItem>, MercadoApiError> {
        let raw: Vec<Value> = self.fetch("missed_feeds")?;
        Ok(raw.into_iter().map(MissedFeedItem::from_raw).collect())
    }
}

/// A [`TokenProvider`] with fixed credentials.
#[derive(Debug, Clone)]
pub struct StubTokenProvider {
    token: String,
    user_id: Option<String>,
}

impl StubTokenProvider {
    pub fn new(token: &str, user_id: &str) -> Self {
        Self { token: token.to_string(), user_id: Some(user_id.to_string()) }
    }

    /// A provider that has a token but no associated marketplace user.
    pub fn without_user(token: &str) -> Self {
        Self { token: token.to_string(), user_id: None }
    }
}

impl TokenProvider for StubTokenProvider {
    async fn access_token(&self) -> Result<String, MercadoApiError> {
        Ok(self.token.clone())
    }

    async fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    async fn token_info(&self) -> Option<TokenInfo> {
        Some(TokenInfo { access_token: Secret::new(self.token.clone()), user_id: self.user_id.clone() })
    }

    async fn clear_cache(&self) {}
}
