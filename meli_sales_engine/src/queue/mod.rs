//! # The in-memory retry queue.
//!
//! Webhook ingestion must acknowledge deliveries long before any reconciliation work happens, so every order
//! notification is turned into a [`QueueTask`] and dropped onto a [`RetryQueue`]. A single dispatcher drains the
//! queue in FIFO order, running at most a configured number of tasks concurrently, and re-enqueues failed tasks
//! after a fixed delay until their attempt budget is spent.
//!
//! The queue deliberately lives in memory only. The durable record is the notification journal: anything lost in a
//! restart is recovered by the unprocessed-notification scan or the missed-feeds endpoint.

mod retry_queue;
mod task;

pub use retry_queue::{QueueConfig, QueueStatistics, RetryQueue, TaskHandler};
pub use task::{QueueTask, TaskError, TaskKind, TaskOrigin, TaskOutcome, TaskSpec};
