//! Serialized execution context
//!
//! An `ExecutionContext` runs submitted callbacks strictly one at a time and in
//! submission order, whichever thread submits them. It owns no thread while
//! idle: the first submission into an empty queue draws one worker from a
//! [`WorkerSpawner`], and that worker exits as soon as the queue is drained.
//!
//! The queue mutex is only held for enqueue/dequeue bookkeeping, never while a
//! callback runs, so new work can be submitted while a long callback executes.
//!
//! A blocking submission issued from the context's own worker would wait on
//! itself. It is rejected with [`ExecutionError::Reentrant`] instead; async
//! submissions from the worker are fine and queue behind the current backlog.
//!
//! A worker job that is dropped without running (spawner refused it, or its
//! tokio runtime is shutting down) releases the queue: every waiting item is
//! failed with [`ExecutionError::WorkerUnavailable`] and the context goes idle.

mod spawner;
mod work_item;

pub use spawner::{
    spawner_from_config, ThreadSpawner, TokioBlockingSpawner, WorkerJob, WorkerSpawner,
};

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};

use crate::config::ExecutionConfig;
use crate::errors::ExecutionError;
use work_item::WorkItem;

// ----------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------

/// Snapshot of an execution context's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Items that ran to completion without panicking
    pub executed: u64,
    /// Items whose callback panicked
    pub faults: u64,
    /// Workers drawn from the spawner so far
    pub workers_spawned: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    executed: AtomicU64,
    faults: AtomicU64,
    workers_spawned: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record(&self, completed: bool) {
        let counter = if completed {
            &self.executed
        } else {
            &self.faults
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ContextStats {
        ContextStats {
            executed: self.executed.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
        }
    }
}

// ----------------------------------------------------------------------------
// Execution Context
// ----------------------------------------------------------------------------

/// FIFO, one-at-a-time executor for cross-thread operations
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    state: Mutex<QueueState>,
    spawner: Arc<dyn WorkerSpawner>,
    stats: StatsCounters,
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<WorkItem>,
    /// A worker has been drawn and has not yet observed an empty queue
    busy: bool,
    /// Thread of the active worker, once it has started
    worker: Option<ThreadId>,
    next_seq: u64,
}

impl ExecutionContext {
    /// Create a context drawing workers from `spawner`
    pub fn new<T: Into<String>>(name: T, spawner: Arc<dyn WorkerSpawner>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(QueueState::default()),
                spawner,
                stats: StatsCounters::default(),
            }),
        }
    }

    /// Create a context that spawns a fresh OS thread per drain cycle
    pub fn with_threads<T: Into<String>>(name: T) -> Self {
        let name = name.into();
        let spawner = Arc::new(ThreadSpawner::new(name.clone()));
        Self::new(name, spawner)
    }

    /// Create a context from configuration
    pub fn from_config<T: Into<String>>(
        name: T,
        config: &ExecutionConfig,
    ) -> Result<Self, ExecutionError> {
        Ok(Self::new(name, spawner_from_config(config)?))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Queue `callback` and return immediately
    ///
    /// The only error is a spawner failure, in which case the callback is
    /// dropped without running.
    pub fn submit_async<F>(&self, callback: F) -> Result<(), ExecutionError>
    where
        F: FnOnce() + Send + 'static,
    {
        Inner::enqueue(&self.inner, |seq| WorkItem::fire_and_forget(seq, callback), false)
    }

    /// Queue `callback` and park the calling thread until it has run
    ///
    /// Everything the callback did is visible to the caller on return. A panic
    /// inside the callback comes back as [`ExecutionError::Fault`].
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context; use
    /// [`ExecutionContext::submit`] there.
    pub fn submit_blocking<F, R>(&self, callback: F) -> Result<R, ExecutionError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (completion, signal) = oneshot::channel();
        Inner::enqueue(
            &self.inner,
            |seq| WorkItem::blocking(seq, callback, completion),
            true,
        )?;

        signal
            .blocking_recv()
            .map_err(|_| ExecutionError::Abandoned)?
    }

    /// Queue `callback` now and return a future resolving to its outcome
    ///
    /// Same ordering and fault semantics as [`ExecutionContext::submit_blocking`],
    /// but suspends the calling task instead of parking its thread. The item
    /// takes its queue position at the call, not at the first poll.
    pub fn submit<F, R>(
        &self,
        callback: F,
    ) -> impl Future<Output = Result<R, ExecutionError>> + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (completion, signal) = oneshot::channel();
        let queued = Inner::enqueue(
            &self.inner,
            |seq| WorkItem::blocking(seq, callback, completion),
            true,
        );

        async move {
            queued?;
            signal.await.map_err(|_| ExecutionError::Abandoned)?
        }
    }

    /// True while a worker is draining the queue
    pub fn is_busy(&self) -> bool {
        self.inner.lock_state().busy
    }

    /// Items waiting to run, excluding the one currently executing
    pub fn queued_len(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// True when called from this context's active worker
    pub fn is_worker_thread(&self) -> bool {
        self.inner.lock_state().worker == Some(thread::current().id())
    }

    pub fn stats(&self) -> ContextStats {
        self.inner.stats.snapshot()
    }
}

impl core::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("ExecutionContext")
            .field("name", &self.inner.name)
            .field("busy", &state.busy)
            .field("queued", &state.queue.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Queue Plumbing
// ----------------------------------------------------------------------------

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // Never held across user code, so a poisoned lock still has a consistent queue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item and draw a worker if none is active
    fn enqueue<B>(this: &Arc<Self>, build: B, waits: bool) -> Result<(), ExecutionError>
    where
        B: FnOnce(u64) -> WorkItem,
    {
        {
            let mut state = this.lock_state();

            if waits && state.worker == Some(thread::current().id()) {
                warn!(context = %this.name, "Rejected blocking submission from own worker");
                return Err(ExecutionError::Reentrant);
            }

            state.next_seq += 1;
            let item = build(state.next_seq);
            trace!(context = %this.name, seq = item.seq(), mode = %item.mode(), "Enqueued work item");
            state.queue.push_back(item);

            if state.busy {
                return Ok(());
            }
            state.busy = true;
        }

        // Spawned without the lock: a spawner that drops the job runs the
        // worker's release path, which takes the lock itself.
        let worker = Worker {
            inner: Arc::clone(this),
            drained: false,
        };
        if let Err(err) = this.spawner.spawn_worker(Box::new(move || worker.run())) {
            error!(context = %this.name, error = %err, "Failed to spawn worker");
            return Err(err);
        }

        this.stats.workers_spawned.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Worker
// ----------------------------------------------------------------------------

/// The job handed to a spawner; owns the context's busy flag until drained
struct Worker {
    inner: Arc<Inner>,
    drained: bool,
}

impl Worker {
    /// Drain the queue, then exit
    fn run(mut self) {
        let inner = Arc::clone(&self.inner);
        debug!(context = %inner.name, "Worker started");
        let worker_id = thread::current().id();

        loop {
            let item = {
                let mut state = inner.lock_state();
                match state.queue.pop_front() {
                    Some(item) => {
                        state.worker = Some(worker_id);
                        item
                    }
                    None => {
                        state.busy = false;
                        state.worker = None;
                        self.drained = true;
                        break;
                    }
                }
            };

            let seq = item.seq();
            let mode = item.mode();
            if let Err(fault) = item.dispatch(&inner.stats) {
                error!(context = %inner.name, seq, %mode, error = %fault, "Work item faulted");
            }
        }

        debug!(context = %inner.name, "Queue drained, worker exiting");
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.drained {
            return;
        }

        let abandoned: Vec<WorkItem> = {
            let mut state = self.inner.lock_state();
            state.busy = false;
            state.worker = None;
            state.queue.drain(..).collect()
        };

        warn!(
            context = %self.inner.name,
            abandoned = abandoned.len(),
            "Worker dropped before draining the queue"
        );
        for item in abandoned {
            item.abandon(ExecutionError::WorkerUnavailable {
                reason: "worker dropped before running".to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_until_idle(ctx: &ExecutionContext) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while ctx.is_busy() {
            assert!(Instant::now() < deadline, "context never went idle");
            thread::sleep(Duration::from_millis(1));
        }
    }

    struct FailingSpawner;

    impl WorkerSpawner for FailingSpawner {
        fn spawn_worker(&self, _job: WorkerJob) -> Result<(), ExecutionError> {
            Err(ExecutionError::WorkerUnavailable {
                reason: "pool exhausted".to_string(),
            })
        }
    }

    #[test]
    fn test_blocking_submission_returns_value() {
        let ctx = ExecutionContext::with_threads("unit");
        let value = ctx.submit_blocking(|| 6 * 7).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_side_effects_visible_after_blocking_return() {
        let ctx = ExecutionContext::with_threads("unit");
        let counter = Arc::new(AtomicUsize::new(0));

        for expected in 1..=10 {
            let c = counter.clone();
            ctx.submit_blocking(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn test_fault_reported_and_worker_survives() {
        let ctx = ExecutionContext::with_threads("unit");

        let result = ctx.submit_blocking(|| -> u8 { panic!("handler exploded") });
        assert_eq!(
            result,
            Err(ExecutionError::Fault {
                message: "handler exploded".to_string()
            })
        );

        assert_eq!(ctx.submit_blocking(|| "still alive").unwrap(), "still alive");
        let stats = ctx.stats();
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.executed, 1);
    }

    #[test]
    fn test_worker_exits_on_drain_and_respawns() {
        let ctx = ExecutionContext::with_threads("unit");

        ctx.submit_blocking(|| ()).unwrap();
        wait_until_idle(&ctx);
        assert_eq!(ctx.stats().workers_spawned, 1);

        ctx.submit_blocking(|| ()).unwrap();
        wait_until_idle(&ctx);
        assert_eq!(ctx.stats().workers_spawned, 2);
        assert_eq!(ctx.queued_len(), 0);
    }

    #[test]
    fn test_reentrant_blocking_submission_rejected() {
        let ctx = ExecutionContext::with_threads("unit");
        let inner = ctx.clone();

        let nested = ctx
            .submit_blocking(move || {
                assert!(inner.is_worker_thread());
                inner.submit_blocking(|| ())
            })
            .unwrap();

        assert_eq!(nested, Err(ExecutionError::Reentrant));
        assert!(!ctx.is_worker_thread());
    }

    #[test]
    fn test_async_submission_from_worker_runs_after_current_item() {
        let ctx = ExecutionContext::with_threads("unit");
        let order = Arc::new(Mutex::new(Vec::new()));

        let (inner, log) = (ctx.clone(), order.clone());
        ctx.submit_async(move || {
            let nested_log = log.clone();
            inner
                .submit_async(move || nested_log.lock().unwrap().push("nested"))
                .unwrap();
            log.lock().unwrap().push("outer");
        })
        .unwrap();

        let log = order.clone();
        ctx.submit_blocking(move || log.lock().unwrap().push("barrier"))
            .unwrap();

        let seen = order.lock().unwrap().clone();
        assert_eq!(seen[0], "outer");
        assert!(seen.contains(&"barrier"));

        ctx.submit_blocking(|| ()).unwrap();
        assert_eq!(order.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_spawn_failure_leaves_context_idle() {
        let ctx = ExecutionContext::new("broken", Arc::new(FailingSpawner));

        let result = ctx.submit_async(|| ());
        assert!(matches!(
            result,
            Err(ExecutionError::WorkerUnavailable { .. })
        ));
        assert!(!ctx.is_busy());
        assert_eq!(ctx.queued_len(), 0);

        let result = ctx.submit_blocking(|| 1);
        assert!(matches!(
            result,
            Err(ExecutionError::WorkerUnavailable { .. })
        ));
        assert_eq!(ctx.stats(), ContextStats::default());
    }

    /// Accepts the job, then drops it without running it
    struct DroppingSpawner;

    impl WorkerSpawner for DroppingSpawner {
        fn spawn_worker(&self, job: WorkerJob) -> Result<(), ExecutionError> {
            drop(job);
            Ok(())
        }
    }

    #[test]
    fn test_stats_current_when_blocking_returns() {
        let ctx = ExecutionContext::with_threads("unit");

        for round in 1..=2000u64 {
            ctx.submit_blocking(|| ()).unwrap();
            assert_eq!(ctx.stats().executed, round);
        }

        let _ = ctx.submit_blocking::<_, ()>(|| panic!("counted"));
        assert_eq!(ctx.stats().faults, 1);
    }

    #[test]
    fn test_dropped_worker_releases_waiters() {
        let ctx = ExecutionContext::new("dropping", Arc::new(DroppingSpawner));

        let result = ctx.submit_blocking(|| 1);
        assert!(matches!(
            result,
            Err(ExecutionError::WorkerUnavailable { .. })
        ));
        assert!(!ctx.is_busy());
        assert_eq!(ctx.queued_len(), 0);

        // Still accepts work; the next draw goes through the same release path
        assert!(ctx.submit_async(|| ()).is_ok());
        assert!(!ctx.is_busy());
    }

    #[test]
    fn test_shut_down_runtime_does_not_hang_submitter() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let ctx = ExecutionContext::new("stale", Arc::new(TokioBlockingSpawner::new(handle)));
        let (tx, rx) = std::sync::mpsc::channel();
        let submitter = ctx.clone();
        thread::spawn(move || {
            let _ = tx.send(submitter.submit_blocking(|| 1));
        });

        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("submitter parked on a dead runtime");
        assert!(matches!(
            result,
            Err(ExecutionError::WorkerUnavailable { .. })
        ));
        assert!(!ctx.is_busy());
        assert_eq!(ctx.queued_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_takes_position_at_call() {
        let ctx = ExecutionContext::from_config("tokio", &ExecutionConfig::tokio()).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = order.clone();
            ctx.submit(move || log.lock().unwrap().push("awaited"))
        };
        {
            let log = order.clone();
            ctx.submit_async(move || log.lock().unwrap().push("queued later"))
                .unwrap();
        }
        first.await.unwrap();
        ctx.submit(|| ()).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["awaited", "queued later"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_await_submission() {
        let ctx = ExecutionContext::from_config("tokio", &ExecutionConfig::tokio()).unwrap();
        let value = ctx.submit(|| String::from("done")).await.unwrap();
        assert_eq!(value, "done");
    }
}
