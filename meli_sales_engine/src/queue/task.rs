use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       TaskKind        -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Reconcile a single order (which may turn out to belong to a pack).
    Order,
    /// Reconcile a pack of orders as one aggregate sale.
    Pack,
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Order => write!(f, "order"),
            TaskKind::Pack => write!(f, "pack"),
        }
    }
}

//--------------------------------------      TaskOrigin       -------------------------------------------------------

/// Where a task came from. Purely informational, but invaluable when reading logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    /// A live webhook delivery
    Live,
    /// The missed-feeds recovery pass
    Recovery,
    /// The unprocessed-notification scan
    Reprocess,
}

impl Display for TaskOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOrigin::Live => write!(f, "live"),
            TaskOrigin::Recovery => write!(f, "recovery"),
            TaskOrigin::Reprocess => write!(f, "reprocess"),
        }
    }
}

//--------------------------------------       TaskSpec        -------------------------------------------------------

/// What to enqueue. The queue turns a spec into a [`QueueTask`] by stamping an id, the attempt budget and the
/// creation time.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub target_id: String,
    pub notification_id: Option<String>,
    pub origin: TaskOrigin,
}

impl TaskSpec {
    pub fn order<S: Into<String>>(target_id: S) -> Self {
        Self { kind: TaskKind::Order, target_id: target_id.into(), notification_id: None, origin: TaskOrigin::Live }
    }

    pub fn pack<S: Into<String>>(target_id: S) -> Self {
        Self { kind: TaskKind::Pack, target_id: target_id.into(), notification_id: None, origin: TaskOrigin::Live }
    }

    /// Ties the task to a stored notification, so that the handler can mark it processed when the task settles.
    pub fn with_notification<S: Into<String>>(mut self, notification_id: S) -> Self {
        self.notification_id = Some(notification_id.into());
        self
    }

    pub fn with_origin(mut self, origin: TaskOrigin) -> Self {
        self.origin = origin;
        self
    }
}

//--------------------------------------       QueueTask       -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QueueTask {
    /// An opaque id, unique enough to trace a task through the logs
    pub id: String,
    pub kind: TaskKind,
    /// The order id or pack id the task operates on
    pub target_id: String,
    /// The journal entry that triggered this task, if any
    pub notification_id: Option<String>,
    pub origin: TaskOrigin,
    /// Number of failed attempts so far
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl QueueTask {
    pub fn new(spec: TaskSpec, max_attempts: u32) -> Self {
        Self {
            id: new_task_id(),
            kind: spec.kind,
            target_id: spec.target_id,
            notification_id: spec.notification_id,
            origin: spec.origin,
            attempt_count: 0,
            max_attempts,
            created_at: Utc::now(),
        }
    }
}

impl Display for QueueTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} task {} for {} ({})", self.kind, self.id, self.target_id, self.origin)
    }
}

fn new_task_id() -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(9).map(char::from).collect::<String>().to_lowercase();
    format!("{}-{suffix}", Utc::now().timestamp_millis())
}

//--------------------------------------      TaskOutcome      -------------------------------------------------------

/// What a successfully completed task produced. Serialised into the notification's `response_data` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// The order id or pack id that was reconciled
    pub target: String,
    /// Number of ledger rows written
    pub records_written: usize,
    pub detail: String,
}

impl TaskOutcome {
    pub fn new<S: Into<String>, D: Into<String>>(target: S, records_written: usize, detail: D) -> Self {
        Self { target: target.into(), records_written, detail: detail.into() }
    }
}

//--------------------------------------       TaskError       -------------------------------------------------------

/// Why a task attempt failed. The queue only needs the message; richer error context stays in the handler's logs.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TaskError(String);

impl TaskError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let a = QueueTask::new(TaskSpec::order("1"), 3);
        let b = QueueTask::new(TaskSpec::order("1"), 3);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn spec_builders() {
        let task = QueueTask::new(
            TaskSpec::pack("2000987").with_notification("abc-1").with_origin(TaskOrigin::Recovery),
            5,
        );
        assert_eq!(task.kind, TaskKind::Pack);
        assert_eq!(task.target_id, "2000987");
        assert_eq!(task.notification_id.as_deref(), Some("abc-1"));
        assert_eq!(task.origin, TaskOrigin::Recovery);
        assert_eq!(task.attempt_count, 0);
        assert_eq!(task.max_attempts, 5);
        assert_eq!(task.to_string(), format!("pack task {} for 2000987 (recovery)", task.id));
    }
}
