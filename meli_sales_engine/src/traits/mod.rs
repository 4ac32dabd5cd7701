//! # Backend interface contracts.
//!
//! This module defines the interfaces that database backends and remote data sources must expose in order to drive
//! the reconciliation engine.
//!
//! ## Storage
//! * [`NotificationManagement`] is the webhook journal: every notification the marketplace delivers (or that we
//!   recover after the fact) is stored exactly once, keyed by the marketplace's notification id, and carries its
//!   processing state.
//! * [`SalesLedger`] is the write interface for the denormalised `sales` table. The single mutating operation is an
//!   upsert keyed on the record's natural key, so reconciling an order twice can never duplicate rows.
//! * [`MarketplaceAccounts`] exposes the seller account that holds the API credentials.
//!
//! ## Remote data
//! * [`OrderSource`] abstracts the marketplace's REST API (orders, shipments, payments, packs, mediations and the
//!   missed-feeds endpoint). The production implementation lives in `mercado_tools`; tests substitute a scripted
//!   source.

mod marketplace_accounts;
mod notification_management;
mod order_source;
mod sales_ledger;

pub use marketplace_accounts::{AccountsError, MarketplaceAccounts};
pub use notification_management::{NotificationManagement, NotificationStoreError};
pub use order_source::OrderSource;
pub use sales_ledger::{SalesLedger, SalesLedgerError};
