//! Priority-aware thread pool with two independent levels.
//!
//! Each [`TaskPriority`] level owns a FIFO queue, a group of dedicated OS
//! worker threads and a pending counter. The counter always equals the number
//! of queued entries and doubles as the wake signal for idle workers; on
//! shutdown it is driven to a negative sentinel.
//!
//! # Design
//!
//! - **No polling**: idle workers park on a Condvar paired with the queue lock
//! - **Non-owning queue entries**: the queue holds `Weak` references plus a
//!   slot index, so a dropped handle never leaves a dangling entry behind
//! - **Synchronous fallback**: a level configured with zero workers runs every
//!   submission on the submitting thread
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_thread_pool::config::ThreadPoolConfig;
//! use prometheus_thread_pool::core::{TaskPriority, ThreadPool};
//!
//! let pool = ThreadPool::new(
//!     ThreadPoolConfig::new()
//!         .with_thread_count(4)
//!         .with_low_priority_thread_count(1),
//! )?;
//!
//! let mut mesh = pool.submit(TaskPriority::Low, || build_mesh());
//! pool.submit_indexed(TaskPriority::Normal, heights.len(), move |i| resample(i))?;
//! let mesh = mesh.get()?;
//! ```

mod for_each;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::ThreadPoolConfig;

use super::error::PoolError;
use super::record::{Job, TaskId, TaskRecord};
use super::{Task, TaskPriority};

/// Pending counter value that tells workers to exit.
const PENDING_SHUTDOWN: isize = isize::MIN / 2;

/// A queued reference to one runnable slot of a record.
struct QueueEntry {
    id: TaskId,
    slot: usize,
    job: Weak<dyn Job>,
}

/// Statistics for one priority level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Level these numbers describe.
    pub priority: TaskPriority,
    /// Number of dedicated worker threads (zero means synchronous fallback).
    pub thread_count: usize,
    /// Entries currently waiting in the queue.
    pub pending_tasks: usize,
    /// Entries ever pushed onto the queue.
    pub submitted_tasks: u64,
    /// Units run by this level's worker threads.
    pub executed_by_workers: u64,
    /// Units run on a caller's thread (direct execution or synchronous fallback).
    pub executed_inline: u64,
    /// Tasks canceled before they started.
    pub canceled_tasks: u64,
}

/// Internal counters for level statistics (thread-safe).
#[derive(Debug, Default)]
struct LevelCounters {
    submitted: AtomicU64,
    executed_by_workers: AtomicU64,
    executed_inline: AtomicU64,
    canceled: AtomicU64,
}

/// Queue, pending counter and wake signal for one priority level.
pub(crate) struct LevelContext {
    priority: TaskPriority,
    thread_count: usize,
    queue: Mutex<VecDeque<QueueEntry>>,
    /// Only modified while `queue` is locked.
    pending: AtomicIsize,
    wake: Condvar,
    counters: LevelCounters,
}

impl LevelContext {
    fn new(priority: TaskPriority, thread_count: usize) -> Self {
        Self {
            priority,
            thread_count,
            queue: Mutex::new(VecDeque::new()),
            pending: AtomicIsize::new(0),
            wake: Condvar::new(),
            counters: LevelCounters::default(),
        }
    }

    fn enqueue(&self, id: TaskId, slot: usize, job: Weak<dyn Job>) {
        {
            let mut queue = self.queue.lock();
            queue.push_back(QueueEntry { id, slot, job });
            self.pending.fetch_add(1, Ordering::SeqCst);
        }
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        self.wake.notify_one();
    }

    /// Remove the entry for `(id, slot)` if it is still queued.
    pub(crate) fn remove(&self, id: TaskId, slot: usize) -> bool {
        let mut queue = self.queue.lock();
        let Some(position) = queue.iter().position(|e| e.id == id && e.slot == slot) else {
            return false;
        };
        queue.remove(position);
        self.pending.fetch_sub(1, Ordering::SeqCst);
        true
    }

    /// Account for a unit the owner ran itself and drop its stale queue entry.
    pub(crate) fn record_direct_execution(&self, id: TaskId) {
        self.record_inline_slot(id, 0);
    }

    fn record_inline_slot(&self, id: TaskId, slot: usize) {
        self.remove(id, slot);
        self.counters.executed_inline.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancellation(&self) {
        self.counters.canceled.fetch_add(1, Ordering::Relaxed);
    }

    fn pending_tasks(&self) -> usize {
        usize::try_from(self.pending.load(Ordering::SeqCst)).unwrap_or(0)
    }

    fn stats(&self) -> LevelStats {
        LevelStats {
            priority: self.priority,
            thread_count: self.thread_count,
            pending_tasks: self.pending_tasks(),
            submitted_tasks: self.counters.submitted.load(Ordering::Relaxed),
            executed_by_workers: self.counters.executed_by_workers.load(Ordering::Relaxed),
            executed_inline: self.counters.executed_inline.load(Ordering::Relaxed),
            canceled_tasks: self.counters.canceled.load(Ordering::Relaxed),
        }
    }

    /// Drive the pending counter to the shutdown sentinel and wake everyone.
    fn stop(&self) {
        {
            let _queue = self.queue.lock();
            self.pending.store(PENDING_SHUTDOWN, Ordering::SeqCst);
        }
        self.wake.notify_all();
    }

    /// Block until an entry is available. `None` means the level is shutting down.
    fn next_entry(&self) -> Option<QueueEntry> {
        let mut queue = self.queue.lock();
        loop {
            while self.pending.load(Ordering::SeqCst) == 0 {
                self.wake.wait(&mut queue);
            }

            // Late cancellations and racing submissions move the counter off
            // the sentinel, but it stays negative.
            if self.pending.load(Ordering::SeqCst) < 0 {
                return None;
            }

            if let Some(entry) = queue.pop_front() {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                return Some(entry);
            }
        }
    }
}

/// Worker loop for one thread of a level.
fn worker_main(level: &LevelContext, worker_id: usize) {
    debug!(worker_id, priority = %level.priority, "worker thread started");

    while let Some(entry) = level.next_entry() {
        let Some(job) = entry.job.upgrade() else {
            trace!(task_id = entry.id, "task handle released before dequeue, skipping");
            continue;
        };

        // The owner may already have run it directly.
        if job.run_if_unclaimed(entry.slot) {
            level.counters.executed_by_workers.fetch_add(1, Ordering::Relaxed);
        } else {
            trace!(task_id = entry.id, slot = entry.slot, "task already claimed, skipping");
        }
    }

    debug!(worker_id, priority = %level.priority, "worker thread exiting");
}

/// Fixed-size thread pool with a low and a normal priority level.
///
/// Submissions return an owning [`Task`] handle. The thread that created the
/// pool is treated as an extra worker by [`ThreadPool::submit_indexed`].
pub struct ThreadPool {
    config: ThreadPoolConfig,
    low: Arc<LevelContext>,
    normal: Arc<LevelContext>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    creator: ThreadId,
    next_task_id: AtomicU64,
    shutdown: AtomicBool,
}

impl ThreadPool {
    /// Create a pool and spawn the configured worker threads.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Spawn` if the OS refuses to start a worker thread
    pub fn new(config: ThreadPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let pool = Self {
            low: Arc::new(LevelContext::new(
                TaskPriority::Low,
                config.low_priority_thread_count,
            )),
            normal: Arc::new(LevelContext::new(TaskPriority::Normal, config.thread_count)),
            workers: Mutex::new(Vec::with_capacity(
                config.thread_count + config.low_priority_thread_count,
            )),
            creator: thread::current().id(),
            next_task_id: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            config,
        };

        // On error `pool` is dropped, which stops and joins what was spawned.
        for priority in TaskPriority::ALL {
            pool.spawn_level(priority)?;
        }

        info!(
            thread_count = pool.config.thread_count,
            low_priority_thread_count = pool.config.low_priority_thread_count,
            "ThreadPool initialized"
        );

        Ok(pool)
    }

    /// Create a pool sized from the number of available CPUs.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Spawn` if a worker thread cannot be started.
    pub fn with_defaults() -> Result<Self, PoolError> {
        Self::new(ThreadPoolConfig::default())
    }

    fn spawn_level(&self, priority: TaskPriority) -> Result<(), PoolError> {
        let level = self.level(priority);
        let mut workers = self.workers.lock();

        for index in 0..level.thread_count {
            let mut builder = thread::Builder::new().name(format!(
                "{}-{}-{index}",
                self.config.thread_name_prefix,
                priority.as_str()
            ));
            if let Some(stack_size) = self.config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let level = Arc::clone(level);
            let handle = builder
                .spawn(move || worker_main(&level, index))
                .map_err(|source| PoolError::Spawn {
                    priority,
                    index,
                    source,
                })?;
            workers.push(handle);
        }

        Ok(())
    }

    const fn level(&self, priority: TaskPriority) -> &Arc<LevelContext> {
        match priority {
            TaskPriority::Low => &self.low,
            TaskPriority::Normal => &self.normal,
        }
    }

    fn next_id(&self) -> TaskId {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Whether submissions to `level` must run on the submitting thread.
    fn runs_inline(&self, level: &LevelContext) -> bool {
        level.thread_count == 0 || self.shutdown.load(Ordering::SeqCst)
    }

    /// Schedule `func` on the given level.
    ///
    /// If the level has no worker threads (or the pool was shut down) the
    /// callable runs right here and the returned task is already ready.
    pub fn submit<F, T>(&self, priority: TaskPriority, func: F) -> Task<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let level = self.level(priority);
        let id = self.next_id();
        let record = Arc::new(TaskRecord::new(
            id,
            priority,
            Arc::downgrade(level),
            Box::new(func),
        ));

        if self.runs_inline(level) {
            trace!(task_id = id, %priority, "no workers for level, executing synchronously");
            if record.try_direct_execute() {
                level.counters.executed_inline.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            let job = Arc::downgrade(&record) as Weak<dyn Job>;
            level.enqueue(id, 0, job);
            trace!(task_id = id, %priority, "task queued");
        }

        Task::from_record(record)
    }

    /// Schedule `func` at [`TaskPriority::Normal`].
    pub fn spawn<F, T>(&self, func: F) -> Task<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(TaskPriority::Normal, func)
    }

    /// Number of worker threads serving a level. Zero means synchronous fallback.
    #[must_use]
    pub fn thread_count(&self, priority: TaskPriority) -> usize {
        self.level(priority).thread_count
    }

    /// Entries currently queued on a level.
    #[must_use]
    pub fn pending_tasks(&self, priority: TaskPriority) -> usize {
        self.level(priority).pending_tasks()
    }

    /// Snapshot of a level's counters.
    #[must_use]
    pub fn stats(&self, priority: TaskPriority) -> LevelStats {
        self.level(priority).stats()
    }

    /// Configuration the pool was built from.
    #[must_use]
    pub const fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Whether the current thread is the one that created the pool.
    #[must_use]
    pub fn is_creator_thread(&self) -> bool {
        thread::current().id() == self.creator
    }

    /// Stop and join all worker threads.
    ///
    /// Running callables finish first. Tasks still queued are not run by the
    /// pool; their handles execute them directly on `wait`/`get` or discard
    /// them on cancel. Later submissions run synchronously. Calling this more
    /// than once does nothing.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Shutting down thread pool");

        self.low.stop();
        self.normal.stop();

        let current = thread::current().id();
        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for handle in workers.drain(..) {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            // A callable may own the last reference to the pool.
            if handle.thread().id() == current {
                warn!(worker = %name, "pool dropped on its own worker thread, detaching it");
                continue;
            }
            if handle.join().is_err() {
                warn!(worker = %name, "worker thread panicked");
            } else {
                debug!(worker = %name, "worker joined");
            }
        }

        info!(worker_count, "Thread pool shut down complete");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("low", &self.low.stats())
            .field("normal", &self.normal.stats())
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
