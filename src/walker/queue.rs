//! Bounded task queue
//!
//! A FIFO queue of deferred tasks gated by a concurrency limit. At most
//! `concurrency` tasks are running at once; the rest wait in submission
//! order. Each dispatched task receives a [`Completion`], its slot in the
//! queue. Completing the slot (explicitly or by dropping it) frees it and
//! dispatches the next waiting task.
//!
//! Dispatch is a trampoline: a slot released while the queue is already
//! dispatching only frees capacity, and the active dispatch loop starts the
//! next task. A backlog of tasks that complete synchronously therefore runs
//! in constant stack depth.
//!
//! The crawl engine and the combinators share one queue, so the bound holds
//! across directory listing and per-file callbacks alike.

use crate::error::{ConfigError, CrawlError, Result};
use crate::once::Once;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Default number of concurrent operations
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A unit of deferred work
pub type Task = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Statistics for the task queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks pushed
    pub pushed: AtomicU64,

    /// Total tasks handed a slot
    pub dispatched: AtomicU64,

    /// Total slots released
    pub completed: AtomicU64,

    /// Total tasks discarded before they started
    pub drained: AtomicU64,

    /// Total `acquire` waiters that gave up before their turn
    pub abandoned: AtomicU64,
}

impl QueueStats {
    /// Number of tasks that have been dispatched
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Number of tasks discarded by `drain` or `shutdown`
    pub fn drained_count(&self) -> u64 {
        self.drained.load(Ordering::Relaxed)
    }

    /// Number of waiters skipped because nobody was left to take the slot
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }
}

/// A queued unit of work
enum Pending {
    Task(Task),
    /// An `acquire` call; the slot is handed over through the channel
    Waiter(oneshot::Sender<Completion>),
}

struct QueueState {
    concurrency: usize,
    running: usize,
    pending: VecDeque<Pending>,
    closed: bool,
    dispatching: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    stats: QueueStats,
}

/// Bounded FIFO task queue
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Create a queue running at most `concurrency` tasks at once
    pub fn new(concurrency: usize) -> std::result::Result<Self, ConfigError> {
        validate_concurrency(concurrency)?;
        Ok(Self::with_limit(concurrency))
    }

    fn with_limit(concurrency: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    concurrency,
                    running: 0,
                    pending: VecDeque::new(),
                    closed: false,
                    dispatching: false,
                }),
                stats: QueueStats::default(),
            }),
        }
    }

    /// Change the concurrency limit
    ///
    /// Takes effect on the next dispatch. Tasks already running above a
    /// lowered limit keep running.
    pub fn set_concurrency(&self, concurrency: usize) -> std::result::Result<(), ConfigError> {
        validate_concurrency(concurrency)?;
        self.shared.state.lock().concurrency = concurrency;
        self.dispatch();
        Ok(())
    }

    /// Current concurrency limit
    pub fn concurrency(&self) -> usize {
        self.shared.state.lock().concurrency
    }

    /// Number of tasks holding a slot
    pub fn running(&self) -> usize {
        self.shared.state.lock().running
    }

    /// Number of tasks waiting for a slot
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.shared.stats
    }

    /// Append a task and try to dispatch
    ///
    /// After [`shutdown`](Self::shutdown) the task is dropped unrun.
    pub fn push<F>(&self, task: F)
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.enqueue(Pending::Task(Box::new(task)));
    }

    fn enqueue(&self, entry: Pending) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                drop(state);
                // Dropped outside the lock: a dropped waiter wakes its receiver.
                drop(entry);
                self.shared.stats.drained.fetch_add(1, Ordering::Relaxed);
                return;
            }
            state.pending.push_back(entry);
        }
        self.shared.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.dispatch();
    }

    /// Discard every task that has not started yet
    ///
    /// Running tasks are unaffected. Returns the number of discarded tasks.
    pub fn drain(&self) -> usize {
        let discarded: Vec<Pending> = self.shared.state.lock().pending.drain(..).collect();
        let count = discarded.len();
        // Dropped outside the lock: a dropped task may release waiters.
        drop(discarded);

        if count > 0 {
            self.shared
                .stats
                .drained
                .fetch_add(count as u64, Ordering::Relaxed);
            debug!(discarded = count, "Drained task queue");
        }
        count
    }

    /// Drain and refuse all further tasks
    pub fn shutdown(&self) -> usize {
        self.shared.state.lock().closed = true;
        self.drain()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Wait for a slot, in FIFO order with every other task
    ///
    /// Fails with [`CrawlError::Drained`] if the wait is discarded by
    /// `drain` or `shutdown`.
    ///
    /// A waiter dropped before its turn is skipped by dispatch without
    /// taking a slot.
    pub async fn acquire(&self) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Pending::Waiter(tx));
        rx.await.map_err(|_| CrawlError::Drained)
    }

    /// Run `work` inside a slot
    pub async fn run<F>(&self, work: F) -> Result<F::Output>
    where
        F: Future,
    {
        let done = self.acquire().await?;
        let output = work.await;
        done.complete();
        Ok(output)
    }

    /// Start waiting tasks until the limit is reached or nothing is pending
    ///
    /// Only one dispatch loop runs at a time. A nested call (a task
    /// completing inside its own body, a slot freed on another thread while
    /// the loop runs) returns at once; the active loop re-checks capacity
    /// after every task, so the freed slot is picked up there.
    fn dispatch(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let _reset = DispatchReset(self);

        loop {
            let entry = {
                let mut state = self.shared.state.lock();
                let next = if state.running < state.concurrency {
                    state.pending.pop_front()
                } else {
                    None
                };
                match next {
                    Some(entry) => {
                        state.running += 1;
                        entry
                    }
                    None => {
                        // Cleared under the same lock as the capacity check so
                        // a concurrent release cannot be missed.
                        state.dispatching = false;
                        return;
                    }
                }
            };

            match entry {
                Pending::Waiter(tx) if tx.is_closed() => {
                    self.shared.state.lock().running -= 1;
                    self.shared.stats.abandoned.fetch_add(1, Ordering::Relaxed);
                }
                Pending::Waiter(tx) => {
                    self.shared.stats.dispatched.fetch_add(1, Ordering::Relaxed);
                    // A receiver dropped since the check hands the slot back.
                    let _ = tx.send(Completion::new(self.clone()));
                }
                Pending::Task(task) => {
                    self.shared.stats.dispatched.fetch_add(1, Ordering::Relaxed);
                    task(Completion::new(self.clone()));
                }
            }
        }
    }

    fn release(&self) {
        {
            let mut state = self.shared.state.lock();
            debug_assert!(state.running > 0, "slot released twice");
            state.running = state.running.saturating_sub(1);
        }
        self.shared.stats.completed.fetch_add(1, Ordering::Relaxed);
        self.dispatch();
    }
}

/// Clears the dispatching flag if a task panics inside the dispatch loop
struct DispatchReset<'a>(&'a TaskQueue);

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.shared.state.lock().dispatching = false;
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CONCURRENCY)
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("TaskQueue")
            .field("concurrency", &state.concurrency)
            .field("running", &state.running)
            .field("pending", &state.pending.len())
            .field("closed", &state.closed)
            .finish()
    }
}

fn validate_concurrency(concurrency: usize) -> std::result::Result<(), ConfigError> {
    if concurrency < 1 {
        return Err(ConfigError::InvalidConcurrency { value: concurrency });
    }
    Ok(())
}

/// Slot held by a dispatched task
///
/// `complete` may be called any number of times; only the first releases
/// the slot. Dropping an uncompleted `Completion` completes it.
pub struct Completion {
    release: Once<Box<dyn FnOnce(()) + Send>>,
}

impl Completion {
    fn new(queue: TaskQueue) -> Self {
        Self {
            release: Once::new(Box::new(move |()| queue.release())),
        }
    }

    /// Release the slot and dispatch the next waiting task
    pub fn complete(&self) {
        self.release.call(());
    }

    /// Whether the slot has been released
    pub fn is_complete(&self) -> bool {
        self.release.is_spent()
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.complete();
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("complete", &self.is_complete())
            .finish()
    }
}
