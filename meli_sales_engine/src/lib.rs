//! Meli Sales Engine
//!
//! The core of the sales processor: everything between an inbound marketplace notification and a reconciled row in
//! the sales ledger. It is transport-agnostic; the HTTP server is a thin shell around the APIs exposed here.
//!
//! The library is divided into four main sections:
//! 1. The notification journal and sales ledger ([`mod@db_types`] for the data types, with SQLite as the storage
//!    backend). You should never need to touch the database directly; the backend implements the storage traits
//!    re-exported at the crate root and everything else goes through the public APIs.
//! 2. The in-memory retry queue ([`mod@queue`]). Ingestion acknowledges deliveries immediately and defers all
//!    remote work onto the queue, which runs tasks with bounded concurrency and a fixed retry delay.
//! 3. The reconciliation engine ([`ReconcilerApi`]). Given an order or pack id it fetches the authoritative remote
//!    state, distinguishes real multi-item packs from spurious ones, and upserts denormalized sale rows.
//! 4. The recovery passes ([`RecoveryApi`]). A missed-feeds poll and an unprocessed-journal scan both feed the same
//!    queue, so notifications lost by the push channel or by a restart are eventually reconciled anyway.
pub mod db_types;
pub mod helpers;
mod mse_api;
pub mod queue;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use mse_api::live_handler::LiveTaskHandler;
pub use mse_api::{
    errors::{ReconciliationError, RecoveryError},
    reconciler_api::ReconcilerApi,
    recovery_api::{RecoveryApi, RecoveryOutcome, ReprocessOutcome, DEFAULT_SCAN_LIMIT},
    token_api::TokenApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountsError,
    MarketplaceAccounts,
    NotificationManagement,
    NotificationStoreError,
    OrderSource,
    SalesLedger,
    SalesLedgerError,
};
