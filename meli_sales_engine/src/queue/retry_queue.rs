use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures_util::{stream::FuturesUnordered, StreamExt};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::{sync::Notify, task::JoinHandle};

use super::task::{QueueTask, TaskError, TaskOutcome, TaskSpec};

//--------------------------------------      QueueConfig      -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of tasks running at the same time. The default of 1 keeps remote API calls strictly
    /// sequential, which is what the marketplace's rate limits want.
    pub max_concurrent: usize,
    /// Fixed delay before a failed task is offered to the queue again
    pub retry_delay: Duration,
    /// Total number of attempts a task gets before it fails permanently
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrent: 1, retry_delay: Duration::from_millis(5000), max_attempts: 3 }
    }
}

//--------------------------------------    QueueStatistics    -------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatistics {
    /// Tasks ever enqueued (retries are not counted again)
    pub total_received: u64,
    pub total_completed: u64,
    /// Tasks that failed permanently
    pub total_failed: u64,
    /// Number of retry re-enqueues
    pub total_retried: u64,
    /// Tasks currently waiting in the queue
    pub queued: usize,
    /// Tasks currently executing
    pub active: usize,
    pub dispatcher_running: bool,
}

//--------------------------------------      TaskHandler      -------------------------------------------------------

/// Executes queue tasks and records their outcomes.
///
/// The dispatcher runs on a spawned tokio task, so all futures must be `Send`. `record_success` and
/// `record_failure` are only called once per task (on completion or on permanent failure, respectively); transient
/// failures that will be retried are not reported. Implementations must swallow their own bookkeeping errors: a
/// failure to mark a notification must never fail the task that produced it.
pub trait TaskHandler: Clone + Send + Sync + 'static {
    /// Runs one task attempt to completion.
    fn execute(&self, task: &QueueTask) -> impl Future<Output = Result<TaskOutcome, TaskError>> + Send;

    /// Records a successful run against the task's originating notification, if any.
    fn record_success(&self, task: &QueueTask, outcome: &TaskOutcome) -> impl Future<Output = ()> + Send;

    /// Records a permanent failure against the task's originating notification, if any.
    fn record_failure(&self, task: &QueueTask, error: &TaskError) -> impl Future<Output = ()> + Send;
}

//--------------------------------------      RetryQueue       -------------------------------------------------------

struct QueueShared {
    config: QueueConfig,
    tasks: Mutex<VecDeque<QueueTask>>,
    wakeup: Notify,
    total_received: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
    total_retried: AtomicU64,
    active: AtomicUsize,
    dispatcher_running: AtomicBool,
}

impl QueueShared {
    fn with_tasks<R>(&self, f: impl FnOnce(&mut VecDeque<QueueTask>) -> R) -> R {
        let mut guard = match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn pop_task(&self) -> Option<QueueTask> {
        self.with_tasks(|q| q.pop_front())
    }

    fn push_task(&self, task: QueueTask) {
        self.with_tasks(|q| q.push_back(task));
        self.wakeup.notify_one();
    }
}

/// A bounded-concurrency FIFO queue with fixed-delay retries.
///
/// `enqueue` never blocks and never applies backpressure; the queue grows without bound and the dispatcher drains
/// it as fast as the concurrency limit allows. Cheap to clone; all clones share the same queue.
#[derive(Clone)]
pub struct RetryQueue {
    shared: Arc<QueueShared>,
}

impl RetryQueue {
    pub fn new(config: QueueConfig) -> Self {
        let shared = QueueShared {
            config,
            tasks: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            total_received: AtomicU64::new(0),
            total_completed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            total_retried: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            dispatcher_running: AtomicBool::new(false),
        };
        Self { shared: Arc::new(shared) }
    }

    /// Adds a task to the back of the queue and returns it. Never blocks.
    pub fn enqueue(&self, spec: TaskSpec) -> QueueTask {
        let task = QueueTask::new(spec, self.shared.config.max_attempts);
        self.shared.total_received.fetch_add(1, Ordering::SeqCst);
        debug!("🔄️ Queued {task}");
        self.shared.push_task(task.clone());
        task
    }

    /// Drops all pending tasks. Tasks already executing run to completion, and the lifetime counters are untouched.
    /// Returns the number of tasks dropped.
    pub fn clear_pending(&self) -> usize {
        let dropped = self.shared.with_tasks(|q| {
            let n = q.len();
            q.clear();
            n
        });
        info!("🔄️ Cleared {dropped} pending task(s) from the queue");
        dropped
    }

    pub fn pending(&self) -> usize {
        self.shared.with_tasks(|q| q.len())
    }

    pub fn statistics(&self) -> QueueStatistics {
        QueueStatistics {
            total_received: self.shared.total_received.load(Ordering::SeqCst),
            total_completed: self.shared.total_completed.load(Ordering::SeqCst),
            total_failed: self.shared.total_failed.load(Ordering::SeqCst),
            total_retried: self.shared.total_retried.load(Ordering::SeqCst),
            queued: self.pending(),
            active: self.shared.active.load(Ordering::SeqCst),
            dispatcher_running: self.shared.dispatcher_running.load(Ordering::SeqCst),
        }
    }

    /// Starts the dispatcher. Do not await the returned JoinHandle, as it will run indefinitely.
    pub fn start<H: TaskHandler>(&self, handler: H) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.dispatcher_running.store(true, Ordering::SeqCst);
            info!("🔄️ Queue dispatcher started. Up to {} task(s) will run concurrently", shared.config.max_concurrent);
            let mut in_flight = FuturesUnordered::new();
            loop {
                while in_flight.len() < shared.config.max_concurrent {
                    let Some(task) = shared.pop_task() else {
                        break;
                    };
                    shared.active.fetch_add(1, Ordering::SeqCst);
                    debug!("🔄️ Starting {task} (attempt {} of {})", task.attempt_count + 1, task.max_attempts);
                    let h = handler.clone();
                    in_flight.push(async move {
                        let result = h.execute(&task).await;
                        (task, result)
                    });
                }
                if in_flight.is_empty() {
                    shared.wakeup.notified().await;
                    continue;
                }
                tokio::select! {
                    Some((task, result)) = in_flight.next() => {
                        shared.active.fetch_sub(1, Ordering::SeqCst);
                        match result {
                            Ok(outcome) => {
                                shared.total_completed.fetch_add(1, Ordering::SeqCst);
                                info!("🔄️ {task} completed. {}", outcome.detail);
                                handler.record_success(&task, &outcome).await;
                            },
                            Err(e) => settle_failed_task(&shared, &handler, task, e).await,
                        }
                    },
                    _ = shared.wakeup.notified() => {},
                }
            }
        })
    }
}

async fn settle_failed_task<H: TaskHandler>(
    shared: &Arc<QueueShared>,
    handler: &H,
    mut task: QueueTask,
    error: TaskError,
) {
    task.attempt_count += 1;
    if task.attempt_count < task.max_attempts {
        shared.total_retried.fetch_add(1, Ordering::SeqCst);
        let delay = shared.config.retry_delay;
        warn!(
            "🔄️ {task} failed on attempt {} of {}: {error}. Retrying in {}ms",
            task.attempt_count,
            task.max_attempts,
            delay.as_millis()
        );
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.push_task(task);
        });
    } else {
        shared.total_failed.fetch_add(1, Ordering::SeqCst);
        error!("🔄️ {task} failed permanently after {} attempt(s): {error}", task.attempt_count);
        handler.record_failure(&task, &error).await;
    }
}
