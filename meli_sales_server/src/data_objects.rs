use std::{fmt::Display, time::Instant};

use chrono::{DateTime, Utc};
use meli_sales_engine::{
    db_types::{Notification, NotificationStatistics},
    queue::QueueStatistics,
    RecoveryOutcome,
    ReprocessOutcome,
};
use mercado_tools::TokenInfo;
use serde::{Deserialize, Serialize};

/// The moment the server came up. Only used to report uptime on the health endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ServerStartTime(Instant);

impl ServerStartTime {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn uptime_secs(&self) -> u64 {
        self.0.elapsed().as_secs()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub queue: QueueStatistics,
}

impl HealthStatus {
    pub fn new(uptime_secs: u64, queue: QueueStatistics) -> Self {
        Self { status: "ok".to_string(), timestamp: Utc::now(), uptime_secs, queue }
    }
}

/// What `/status` reports about the marketplace credentials. The token itself never leaves the server;
/// its presence is all an operator needs to know.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStatus {
    pub user_id: Option<String>,
    pub access_token: String,
}

impl From<TokenInfo> for TokenStatus {
    fn from(info: TokenInfo) -> Self {
        Self { user_id: info.user_id, access_token: "***".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub token: Option<TokenStatus>,
    pub queue: QueueStatistics,
    pub timestamp: DateTime<Utc>,
}

impl ServerStatus {
    pub fn new(token: Option<TokenStatus>, queue: QueueStatistics) -> Self {
        Self { status: "running".to_string(), token, queue, timestamp: Utc::now() }
    }
}

/// Response for the manual enqueue endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub message: String,
    pub queue: QueueStatistics,
}

impl QueueResponse {
    pub fn new<S: Display>(message: S, queue: QueueStatistics) -> Self {
        Self { message: message.to_string(), queue }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainResponse {
    pub message: String,
    pub discarded: usize,
    pub queue: QueueStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: RecoveryOutcome,
    pub queue: QueueStatistics,
}

impl RecoveryResponse {
    pub fn new<S: Display>(message: S, outcome: RecoveryOutcome, queue: QueueStatistics) -> Self {
        Self { success: true, message: message.to_string(), outcome, queue }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprocessResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: ReprocessOutcome,
    pub queue: QueueStatistics,
}

impl ReprocessResponse {
    pub fn new<S: Display>(message: S, outcome: ReprocessOutcome, queue: QueueStatistics) -> Self {
        Self { success: true, message: message.to_string(), outcome, queue }
    }
}

/// One page of the notification journal, echoing the effective paging parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationHistory {
    pub success: bool,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub data: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: NotificationStatistics,
    pub queue: QueueStatistics,
}
