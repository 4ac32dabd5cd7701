//! Database types for the sales reconciliation engine.
//!
//! The two main tables are `notifications` (the durable journal of every webhook the marketplace has ever sent us)
//! and `sales` (the denormalised reconciliation ledger that reporting reads from). Both are represented here as
//! plain structs that map 1:1 onto their table rows.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use mercado_tools::{json_scalar_to_string, MissedFeedItem};
use msp_common::Brl;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      RecordType       -------------------------------------------------------

/// Discriminates the four kinds of rows that live in the `sales` table.
///
/// A single-item order produces one [`RecordType::Sale`] row. A multi-item order produces one
/// [`RecordType::SaleItem`] row per line item. A cart (pack) spanning several distinct products produces one
/// [`RecordType::Pack`] summary row plus one [`RecordType::PackItem`] row per line item of each member order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    #[default]
    Sale,
    SaleItem,
    Pack,
    PackItem,
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::Sale => write!(f, "sale"),
            RecordType::SaleItem => write!(f, "sale_item"),
            RecordType::Pack => write!(f, "pack"),
            RecordType::PackItem => write!(f, "pack_item"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid record type: {0}")]
pub struct RecordTypeConversionError(String);

impl FromStr for RecordType {
    type Err = RecordTypeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(Self::Sale),
            "sale_item" => Ok(Self::SaleItem),
            "pack" => Ok(Self::Pack),
            "pack_item" => Ok(Self::PackItem),
            s => Err(RecordTypeConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      Notification     -------------------------------------------------------

/// A stored webhook notification.
///
/// `notification_id` is the marketplace's own id for the delivery and is unique in the store. Redeliveries of the
/// same notification merge into the existing row rather than creating a new one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub notification_id: String,
    /// Resource path the notification refers to, e.g. `/orders/2000012345678901`
    pub resource: Option<String>,
    pub topic: Option<String>,
    pub user_id: Option<String>,
    pub application_id: Option<String>,
    /// Delivery attempt counter as reported by the marketplace. Kept verbatim.
    pub attempts: Option<String>,
    /// When the marketplace says it sent the notification
    pub sent_at: Option<DateTime<Utc>>,
    /// When we received (or recovered) the notification
    pub received_at: DateTime<Utc>,
    /// The raw notification payload, as JSON text
    pub request_data: Option<String>,
    /// Summary of the reconciliation outcome, as JSON text
    pub response_data: Option<String>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewNotification    -------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub notification_id: String,
    pub resource: Option<String>,
    pub topic: Option<String>,
    pub user_id: Option<String>,
    pub application_id: Option<String>,
    pub attempts: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub request_data: Option<String>,
}

impl NewNotification {
    pub fn new<S: Into<String>>(notification_id: S) -> Self {
        Self {
            notification_id: notification_id.into(),
            resource: None,
            topic: None,
            user_id: None,
            application_id: None,
            attempts: None,
            sent_at: None,
            received_at: Utc::now(),
            request_data: None,
        }
    }

    /// Maps a marketplace feed entry onto the journal's ingestion shape. Both the live webhook path and the
    /// missed-feeds recovery sweep go through here, so redeliveries merge no matter which path saw them first.
    ///
    /// The attempt counter defaults to "0" and the raw payload is retained verbatim. Entries occasionally arrive
    /// without an id; the journal requires one, so a unique key is synthesized for them.
    pub fn from_feed(entry: &MissedFeedItem) -> Self {
        let notification_id = entry.id.clone().unwrap_or_else(generated_feed_id);
        let mut notification = Self::new(notification_id);
        notification.resource = entry.resource.clone();
        notification.topic = entry.topic.clone();
        notification.user_id = entry.user_id.as_ref().and_then(json_scalar_to_string);
        notification.application_id = entry.application_id.as_ref().and_then(json_scalar_to_string);
        notification.attempts =
            Some(entry.attempts.as_ref().and_then(json_scalar_to_string).unwrap_or_else(|| "0".to_string()));
        notification.sent_at = entry.sent;
        notification.request_data = Some(entry.request_data().to_string());
        notification
    }
}

fn generated_feed_id() -> String {
    let suffix: u32 = rand::random();
    format!("feed-{}-{suffix:08x}", Utc::now().timestamp_millis())
}

//--------------------------------------   NotificationUpdate  -------------------------------------------------------

/// A partial update against a stored notification. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationUpdate {
    pub processed: Option<bool>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub response_data: Option<String>,
    pub attempts: Option<String>,
}

impl NotificationUpdate {
    /// Marks the notification as successfully reconciled and records the outcome summary.
    pub fn completed<S: Into<String>>(response: S) -> Self {
        Self {
            processed: Some(true),
            processed_at: Some(Utc::now()),
            response_data: Some(response.into()),
            ..Default::default()
        }
    }

    /// Records a terminal failure. The notification stays unprocessed so the recovery scan can pick it up again.
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            processed: Some(false),
            processed_at: Some(Utc::now()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

//--------------------------------------   NotificationQuery   -------------------------------------------------------

/// Page size applied when a query does not name a limit.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub processed: Option<bool>,
    pub topic: Option<String>,
}

impl NotificationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_processed(mut self, processed: bool) -> Self {
        self.processed = Some(processed);
        self
    }

    pub fn with_topic<S: Into<String>>(mut self, topic: S) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// One page of notifications, most recent first, along with the total number of rows matching the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub data: Vec<Notification>,
    pub total: i64,
}

//------------------------------------- NotificationStatistics -------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStatistics {
    pub total: i64,
    pub processed: i64,
    pub unprocessed: i64,
    /// Rows with a non-empty error message
    pub with_error: i64,
    /// Row counts keyed by topic. Rows without a topic are counted under `unknown`.
    pub by_topic: BTreeMap<String, i64>,
    /// Rows received in the last 24 hours
    pub last_24_hours: i64,
}

//--------------------------------------      SaleRecord       -------------------------------------------------------

/// A row in the denormalised sales ledger.
///
/// The natural key is `(record_type, pack_id, order_id, item_id)` with NULLs for dimensions that do not apply to
/// the record type. Reconciling the same order or pack again updates the existing rows in place.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub record_type: RecordType,
    pub order_id: Option<i64>,
    pub item_id: Option<String>,
    pub pack_id: Option<String>,
    pub is_pack: bool,
    pub item_title: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Brl>,
    pub marketplace_fee: Option<Brl>,
    pub listing_type: Option<String>,
    pub buyer_id: Option<i64>,
    pub buyer_name: Option<String>,
    pub order_status: Option<String>,
    pub status_detail: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
    pub order_updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub total_amount: Option<Brl>,
    pub paid_amount: Option<Brl>,
    pub currency: Option<String>,
    pub sales_channel: Option<String>,
    pub payment_method: Option<String>,
    pub payment_type: Option<String>,
    pub installments: Option<i64>,
    pub financing_fee: Option<Brl>,
    pub installment_details: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub shipment_id: Option<i64>,
    pub shipping_status: Option<String>,
    pub shipping_substatus: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub zip_code: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub shipment_created_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub seller_shipping_cost: Option<Brl>,
    pub buyer_shipping_cost: Option<Brl>,
    pub shipping_paid_by: Option<String>,
    pub shipping_subsidy: Option<Brl>,
    pub shipping_list_cost: Option<Brl>,
    pub shipping_cost_type: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub has_refund: bool,
    pub refund_amount: Option<Brl>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub claim_id: Option<i64>,
    pub claim_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewSaleRecord     -------------------------------------------------------

/// The insertable portion of a [`SaleRecord`]. Usually built with struct update syntax over
/// [`NewSaleRecord::default()`], filling in whichever columns apply to the record type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSaleRecord {
    pub record_type: RecordType,
    pub order_id: Option<i64>,
    pub item_id: Option<String>,
    pub pack_id: Option<String>,
    pub is_pack: bool,
    pub item_title: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Brl>,
    pub marketplace_fee: Option<Brl>,
    pub listing_type: Option<String>,
    pub buyer_id: Option<i64>,
    pub buyer_name: Option<String>,
    pub order_status: Option<String>,
    pub status_detail: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
    pub order_updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub total_amount: Option<Brl>,
    pub paid_amount: Option<Brl>,
    pub currency: Option<String>,
    pub sales_channel: Option<String>,
    pub payment_method: Option<String>,
    pub payment_type: Option<String>,
    pub installments: Option<i64>,
    pub financing_fee: Option<Brl>,
    pub installment_details: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub shipment_id: Option<i64>,
    pub shipping_status: Option<String>,
    pub shipping_substatus: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub zip_code: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub shipment_created_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub seller_shipping_cost: Option<Brl>,
    pub buyer_shipping_cost: Option<Brl>,
    pub shipping_paid_by: Option<String>,
    pub shipping_subsidy: Option<Brl>,
    pub shipping_list_cost: Option<Brl>,
    pub shipping_cost_type: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub has_refund: bool,
    pub refund_amount: Option<Brl>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub claim_id: Option<i64>,
    pub claim_reason: Option<String>,
}

impl NewSaleRecord {
    /// A human-readable description of the row's natural key, for logging.
    pub fn key_description(&self) -> String {
        format!(
            "{} (pack: {}, order: {}, item: {})",
            self.record_type,
            self.pack_id.as_deref().unwrap_or("-"),
            self.order_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            self.item_id.as_deref().unwrap_or("-"),
        )
    }
}

impl Display for NewSaleRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sale record {}", self.key_description())
    }
}

//--------------------------------------  MarketplaceAccount   -------------------------------------------------------

/// A seller account on the marketplace, holding the API credentials the reconciler uses.
#[derive(Debug, Clone, FromRow)]
pub struct MarketplaceAccount {
    pub id: i64,
    pub name: String,
    pub marketplace_user_id: Option<String>,
    pub access_token: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
