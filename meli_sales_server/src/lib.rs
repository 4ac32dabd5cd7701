//! # Sales processor server
//! This crate hosts the HTTP shell around [`meli_sales_engine`]. It is responsible for:
//! Listening for incoming webhook notifications from Mercado Livre and acknowledging them immediately.
//! Journaling every delivery and queueing order-related ones for reconciliation.
//! Exposing the operator surface: manual processing, recovery sweeps, queue control, history and statistics.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/webhook` (and `/`): the ingestion endpoint for marketplace push notifications.
//! * `/health` and `/status`: liveness and a snapshot of token/queue state.
//! * `/process/order/{order_id}`, `/process/pack/{pack_id}`, `/queue/clear`: manual queue control.
//! * `/recovery/missed-feeds`, `/recovery/reprocess`: on-demand recovery sweeps.
//! * `/notifications`, `/notifications/statistics`: the journal's query surface.

pub mod config;
pub mod data_objects;
pub mod errors;

pub mod recovery_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
