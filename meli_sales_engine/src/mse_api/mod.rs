//! # Sales engine public API
//!
//! The `mse_api` module exposes the programmatic API for the sales reconciliation engine. The API is
//! modular, so that clients can pick the functionality they need, and each piece is generic over the
//! backend traits it depends on.
//!
//! * [`reconciler_api`] turns a single order or pack id into denormalised ledger rows, fetching the
//!   supporting shipment, payment, pack and mediation resources with paced sequential calls.
//! * [`recovery_api`] pulls notifications the push channel failed to deliver and re-queues
//!   notifications that are stored but were never processed.
//! * [`token_api`] caches the active marketplace account's credentials for the REST client.
//! * [`live_handler`] wires the reconciler into the retry queue and writes the processing result
//!   back onto the originating notification.
//!
//! The pattern for using the APIs is the same throughout: construct the API with a database backend
//! (and, where applicable, a remote order source), then call its async methods. `SqliteDatabase`
//! implements all of the backend traits.

pub mod errors;
pub mod reconciler_api;
pub mod recovery_api;
pub mod sale_builder;
pub mod token_api;

#[cfg(feature = "sqlite")]
pub mod live_handler;
