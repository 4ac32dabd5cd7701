//! Serde models for the marketplace read APIs.
//!
//! The upstream schema is large, loosely documented and changes without notice, so every field is
//! optional and unknown fields are ignored. Only the fields the reconciliation rules actually
//! consume are modelled; everything else rides along in the raw payloads kept for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------   Shared helpers    ---------------------------------------------------------

/// Renders a JSON scalar as text (ids and attempt counters arrive as either strings or numbers).
pub fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Whether a notification refers to an order event. Anything else is stored for audit but never
/// queued for reconciliation.
pub fn is_order_related(topic: Option<&str>, resource: Option<&str>) -> bool {
    topic == Some("orders") || resource.map(|r| r.contains("/orders/")).unwrap_or(false)
}

/// The trailing path segment of a notification resource, e.g. `/orders/123` -> `123`.
pub fn order_id_from_resource(resource: &str) -> Option<String> {
    resource.rsplit('/').next().filter(|s| !s.is_empty()).map(String::from)
}

//--------------------------------------      Orders         ---------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MercadoOrder {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub status_detail: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_closed: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub currency_id: Option<String>,
    pub buyer: Option<Buyer>,
    pub order_items: Option<Vec<OrderItemEntry>>,
    pub payments: Option<Vec<OrderPayment>>,
    pub pack_id: Option<i64>,
    pub shipping: Option<ShippingInfo>,
    pub mediations: Option<Vec<MediationRef>>,
    pub cancel_detail: Option<CancelDetail>,
    pub context: Option<OrderContext>,
    pub order_costs: Option<OrderCosts>,
}

impl MercadoOrder {
    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    pub fn pack_id_string(&self) -> Option<String> {
        self.pack_id.map(|id| id.to_string())
    }

    pub fn items(&self) -> &[OrderItemEntry] {
        self.order_items.as_deref().unwrap_or_default()
    }

    pub fn first_payment(&self) -> Option<&OrderPayment> {
        self.payments.as_deref().unwrap_or_default().first()
    }

    pub fn mediation_id(&self) -> Option<i64> {
        self.mediations.as_deref().unwrap_or_default().first().and_then(|m| m.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buyer {
    pub id: Option<i64>,
    pub nickname: Option<String>,
    #[serde(alias = "firstname")]
    pub first_name: Option<String>,
    #[serde(alias = "lastname")]
    pub last_name: Option<String>,
}

impl Buyer {
    /// "First Last", falling back to the nickname when no name parts are present.
    pub fn display_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        let full = format!("{first} {last}");
        let full = full.trim();
        if full.is_empty() {
            self.nickname.clone()
        } else {
            Some(full.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderItemEntry {
    pub item: Option<ItemInfo>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub sale_fee: Option<f64>,
    pub listing_type_id: Option<String>,
}

impl OrderItemEntry {
    pub fn item_id(&self) -> Option<&str> {
        self.item.as_ref().and_then(|i| i.id.as_deref())
    }

    pub fn variation_id(&self) -> Option<i64> {
        self.item.as_ref().and_then(|i| i.variation_id)
    }

    pub fn title(&self) -> Option<&str> {
        self.item.as_ref().and_then(|i| i.title.as_deref())
    }

    pub fn sku(&self) -> Option<&str> {
        self.item.as_ref().and_then(|i| i.seller_sku.as_deref())
    }

    pub fn quantity_or_one(&self) -> i64 {
        self.quantity.unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub variation_id: Option<i64>,
    pub seller_sku: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPayment {
    pub id: Option<i64>,
    pub payment_method_id: Option<String>,
    pub payment_type: Option<String>,
    pub installments: Option<i64>,
    pub total_paid_amount: Option<f64>,
    pub date_approved: Option<DateTime<Utc>>,
    pub financing_fee: Option<FinancingFee>,
    pub shipping_cost: Option<f64>,
    pub refunds: Option<Vec<Refund>>,
}

impl OrderPayment {
    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    pub fn refunds(&self) -> &[Refund] {
        self.refunds.as_deref().unwrap_or_default()
    }

    pub fn financing_fee_amount(&self) -> Option<f64> {
        self.financing_fee.as_ref().and_then(|f| f.amount)
    }
}

/// Financing fees arrive as an object, of which only the amount matters here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancingFee {
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Refund {
    pub amount: Option<f64>,
    pub date_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderContext {
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCosts {
    pub shipping_fee: Option<f64>,
    pub seller_shipping_discount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelDetail {
    pub cancelled_by: Option<String>,
    pub reason: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
}

//--------------------------------------     Shipping        ---------------------------------------------------------

/// The `shipping` stanza embedded in an order. A subset of the full shipment resource; the
/// reconciler prefers the dedicated shipment fetch and falls back to these fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub substatus: Option<String>,
    pub cost: Option<f64>,
    pub cost_type: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub logistic_type: Option<String>,
    pub receiver_address: Option<ReceiverAddress>,
    pub shipping_method: Option<NamedRef>,
}

impl ShippingInfo {
    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub substatus: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_method: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub cost_type: Option<String>,
    pub status_history: Option<StatusHistory>,
    pub estimated_delivery_time: Option<EstimatedDelivery>,
    pub shipping_option: Option<ShippingOption>,
    pub lead_time: Option<LeadTime>,
    pub logistic: Option<Logistic>,
    pub carrier: Option<NamedRef>,
    pub receiver_address: Option<ReceiverAddress>,
    pub destination: Option<Destination>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusHistory {
    pub date_delivered: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimatedDelivery {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingOption {
    pub estimated_delivery_time: Option<EstimatedDelivery>,
    pub list_cost: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadTime {
    pub list_cost: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logistic {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Destination {
    pub shipping_address: Option<ReceiverAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiverAddress {
    pub zip_code: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<NameOrString>,
    pub state: Option<NameOrString>,
    pub country: Option<NameOrString>,
}

/// Address components arrive either as a bare string or as an object with a `name` field,
/// depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameOrString {
    Plain(String),
    Named { name: Option<String> },
}

impl NameOrString {
    pub fn name(&self) -> Option<&str> {
        match self {
            NameOrString::Plain(s) => Some(s.as_str()),
            NameOrString::Named { name } => name.as_deref(),
        }
    }
}

//--------------------------------------   Packs & claims    ---------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pack {
    pub id: Option<i64>,
    pub orders: Option<Vec<PackOrderRef>>,
}

impl Pack {
    pub fn orders(&self) -> &[PackOrderRef] {
        self.orders.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackOrderRef {
    pub id: Option<i64>,
}

impl PackOrderRef {
    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediationRef {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mediation {
    pub claims: Option<Vec<MediationClaim>>,
}

impl Mediation {
    pub fn first_reason(&self) -> Option<&str> {
        self.claims.as_deref().unwrap_or_default().first().and_then(|c| c.reason.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediationClaim {
    pub reason: Option<String>,
}

//--------------------------------------    Missed feeds     ---------------------------------------------------------

/// One entry from the missed-feeds endpoint. The full raw payload is retained alongside the
/// recognized fields so recovered notifications are stored with the same audit detail as live ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissedFeedItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub resource: Option<String>,
    pub topic: Option<String>,
    pub user_id: Option<Value>,
    pub application_id: Option<Value>,
    pub attempts: Option<Value>,
    pub sent: Option<DateTime<Utc>>,
    pub request: Option<Value>,
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl MissedFeedItem {
    pub fn from_raw(raw: Value) -> Self {
        let mut item = serde_json::from_value::<MissedFeedItem>(raw.clone()).unwrap_or_default();
        item.raw = Some(raw);
        item
    }

    /// The payload to store verbatim: the feed's embedded request when present, else the whole item.
    pub fn request_data(&self) -> Value {
        self.request.clone().or_else(|| self.raw.clone()).unwrap_or(Value::Null)
    }

    pub fn is_order_related(&self) -> bool {
        is_order_related(self.topic.as_deref(), self.resource.as_deref())
    }
}
