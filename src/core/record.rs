//! Shared per-task state: the started flag, completion signal and result slot.
//!
//! A [`TaskRecord`] is owned by its [`Task`](crate::core::Task) handle. Queue
//! entries only hold a `Weak<dyn Job>` plus a slot index, so a worker that
//! dequeues an entry whose handle is already gone simply finds nothing to run.
//!
//! Exactly one of {worker dequeue, direct execution from `wait`, `cancel`}
//! wins the compare-and-set on the started flag. The winner is the only path
//! allowed to run (or discard) the callable.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::error::{contract_violation, TaskError};
use super::latch::CompletionLatch;
use super::thread_pool::LevelContext;
use super::TaskPriority;

/// Identifier assigned to every submission, unique within one pool.
pub type TaskId = u64;

/// Observable lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in its level's queue.
    Queued,
    /// Claimed by a worker or a direct caller and currently running.
    Executing,
    /// The callable returned or panicked.
    Completed,
    /// Removed before it ever started.
    Canceled,
}

/// Something a worker can pull out of a queue entry and run.
pub(crate) trait Job: Send + Sync {
    /// Run `slot` unless someone already claimed it. Returns whether this call ran it.
    fn run_if_unclaimed(&self, slot: usize) -> bool;
}

/// Started flag plus completion signal for one schedulable unit.
#[derive(Debug, Default)]
pub(crate) struct TaskState {
    started: AtomicBool,
    canceled: AtomicBool,
    completed: CompletionLatch,
}

impl TaskState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Flip started false -> true. Only one caller ever gets `true`.
    pub(crate) fn try_claim(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.completed.is_set()
    }

    pub(crate) fn complete(&self) {
        self.completed.set();
    }

    pub(crate) fn wait_complete(&self) {
        self.completed.wait();
    }

    /// Must only be called by the winner of `try_claim`.
    fn mark_canceled(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.completed.set();
    }

    pub(crate) fn status(&self) -> TaskStatus {
        if self.canceled.load(Ordering::SeqCst) {
            TaskStatus::Canceled
        } else if self.is_complete() {
            TaskStatus::Completed
        } else if self.has_started() {
            TaskStatus::Executing
        } else {
            TaskStatus::Queued
        }
    }
}

enum Outcome<T> {
    Pending,
    Value(T),
    Panicked(Box<dyn Any + Send>),
    Taken,
}

type Work<T> = Box<dyn FnOnce() -> T + Send>;

/// State for a single submitted callable.
pub(crate) struct TaskRecord<T> {
    id: TaskId,
    priority: TaskPriority,
    state: TaskState,
    work: Mutex<Option<Work<T>>>,
    outcome: Mutex<Outcome<T>>,
    level: Weak<LevelContext>,
}

impl<T> TaskRecord<T> {
    pub(crate) fn new(
        id: TaskId,
        priority: TaskPriority,
        level: Weak<LevelContext>,
        work: Work<T>,
    ) -> Self {
        Self {
            id,
            priority,
            state: TaskState::new(),
            work: Mutex::new(Some(work)),
            outcome: Mutex::new(Outcome::Pending),
            level,
        }
    }

    pub(crate) const fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) const fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub(crate) fn status(&self) -> TaskStatus {
        self.state.status()
    }

    pub(crate) fn ready(&self) -> bool {
        self.state.is_complete()
    }

    /// Run the callable. The caller must have won `try_claim`.
    fn execute(&self) {
        let work = self.work.lock().take();
        let outcome = match work {
            Some(work) => match catch_unwind(AssertUnwindSafe(work)) {
                Ok(value) => Outcome::Value(value),
                Err(payload) => {
                    debug!(task_id = self.id, "task panicked, storing payload");
                    Outcome::Panicked(payload)
                }
            },
            None => contract_violation("execute", "task callable was already consumed"),
        };
        *self.outcome.lock() = outcome;
        self.state.complete();
    }

    /// Run the callable on the current thread if no worker has started it.
    pub(crate) fn try_direct_execute(&self) -> bool {
        if !self.state.try_claim() {
            return false;
        }
        trace!(task_id = self.id, priority = %self.priority, "executing task directly");
        self.execute();
        true
    }

    /// Wait for completion, stealing the work if it is still queued.
    pub(crate) fn wait(&self) {
        if self.state.is_complete() {
            return;
        }

        if self.try_direct_execute() {
            if let Some(level) = self.level.upgrade() {
                level.record_direct_execution(self.id);
            }
            return;
        }

        self.state.wait_complete();
    }

    /// Wait for completion without ever running the callable here.
    pub(crate) fn wait_no_execute(&self) {
        self.state.wait_complete();
    }

    /// Remove from the queue if still queued. If a worker or direct caller
    /// already started the callable, optionally block until it finishes.
    /// Calling this on a completed or canceled record does nothing.
    pub(crate) fn cancel(&self, wait_for_running: bool) {
        let level = self.level.upgrade();
        let removed = level.as_ref().is_some_and(|level| level.remove(self.id, 0));

        if self.state.try_claim() {
            drop(self.work.lock().take());
            self.state.mark_canceled();
            if let Some(level) = &level {
                level.record_cancellation();
            }
            debug!(task_id = self.id, removed_from_queue = removed, "task canceled before execution");
        } else if wait_for_running {
            trace!(task_id = self.id, "task already started, waiting for it before canceling");
            self.state.wait_complete();
        }
    }

    /// Move the stored outcome out. Only valid once, after completion.
    pub(crate) fn take_outcome(&self) -> Result<T, TaskError> {
        let outcome = std::mem::replace(&mut *self.outcome.lock(), Outcome::Taken);
        match outcome {
            Outcome::Value(value) => Ok(value),
            Outcome::Panicked(payload) => Err(TaskError::from_panic(payload)),
            Outcome::Pending => contract_violation("get", "task has no result"),
            Outcome::Taken => contract_violation("get", "task result was already taken"),
        }
    }
}

impl<T: Send + 'static> Job for TaskRecord<T> {
    fn run_if_unclaimed(&self, _slot: usize) -> bool {
        self.try_direct_execute()
    }
}
