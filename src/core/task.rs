//! Owning handle for a task submitted to a [`ThreadPool`](crate::core::ThreadPool).

use std::fmt;
use std::sync::Arc;

use super::error::{contract_violation, TaskError};
use super::record::{TaskId, TaskRecord, TaskStatus};
use super::TaskPriority;

/// The single owner of a submitted task.
///
/// Dropping a handle whose task has not completed cancels it: a queued task is
/// removed and never runs, a running task is waited for. Every method except
/// [`Task::is_valid`] terminates the process when called on an empty handle
/// (a default-constructed one, or one that was canceled).
///
/// ```rust,ignore
/// let pool = ThreadPool::new(ThreadPoolConfig::new().with_thread_count(2))?;
/// let mut task = pool.submit(TaskPriority::Normal, || 6 * 7);
/// assert_eq!(task.get()?, 42);
/// ```
#[must_use = "dropping a task handle cancels the task"]
pub struct Task<T> {
    record: Option<Arc<TaskRecord<T>>>,
    result_obtained: bool,
}

impl<T> Task<T> {
    pub(crate) const fn from_record(record: Arc<TaskRecord<T>>) -> Self {
        Self {
            record: Some(record),
            result_obtained: false,
        }
    }

    fn valid_record(&self, operation: &'static str) -> &Arc<TaskRecord<T>> {
        match &self.record {
            Some(record) => record,
            None => contract_violation(operation, "task handle is empty or was canceled"),
        }
    }

    /// Whether this handle refers to a scheduled task.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    /// Identifier of the task within its pool.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.valid_record("id").id()
    }

    /// Level the task was submitted to.
    #[must_use]
    pub fn priority(&self) -> TaskPriority {
        self.valid_record("priority").priority()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.valid_record("status").status()
    }

    /// Whether the result (value or panic) is available. Never blocks.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.valid_record("ready").ready()
    }

    /// Block until the task has completed.
    ///
    /// If no worker has picked the task up yet, it runs on the calling thread
    /// instead. Calling this repeatedly never runs the task more than once.
    pub fn wait(&self) {
        self.valid_record("wait").wait();
    }

    /// Block until the task has completed, without ever running it here.
    pub fn wait_no_execute(&self) {
        self.valid_record("wait_no_execute").wait_no_execute();
    }

    /// Wait for the task and take its result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Panicked`] carrying the original payload if the
    /// callable panicked.
    ///
    /// Calling `get` a second time is a contract violation and aborts.
    pub fn get(&mut self) -> Result<T, TaskError> {
        if self.record.is_none() || std::mem::replace(&mut self.result_obtained, true) {
            contract_violation("get", "called on an empty handle or more than once");
        }

        let record = self.valid_record("get");
        record.wait();
        record.take_outcome()
    }

    /// Cancel the task and release the handle.
    ///
    /// A queued task is removed from its queue and never runs. A task that has
    /// already started is waited for, so data the callable uses may be freed
    /// safely once this returns. Afterwards the handle is empty.
    pub fn cancel(&mut self) {
        self.valid_record("cancel").cancel(true);
        self.record = None;
    }

    /// Like [`Task::cancel`], but returns immediately if the task is running.
    pub fn cancel_no_wait(&mut self) {
        self.valid_record("cancel_no_wait").cancel(false);
        self.record = None;
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T: Send + 'static> Task<T> {
    /// Await the result from async code.
    ///
    /// The blocking join (or direct execution) happens on tokio's blocking
    /// thread pool so the async runtime is never stalled.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Panicked`] if the callable panicked, or
    /// [`TaskError::Join`] if the blocking thread could not be joined.
    pub async fn get_async(mut self) -> Result<T, TaskError> {
        tokio::task::spawn_blocking(move || self.get())
            .await
            .map_err(|e| TaskError::Join(e.to_string()))?
    }
}

impl<T> Default for Task<T> {
    /// An empty handle, valid for nothing but [`Task::is_valid`].
    fn default() -> Self {
        Self {
            record: None,
            result_obtained: false,
        }
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            if !record.ready() {
                record.cancel(true);
            }
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => f
                .debug_struct("Task")
                .field("id", &record.id())
                .field("priority", &record.priority())
                .field("status", &record.status())
                .field("result_obtained", &self.result_obtained)
                .finish(),
            None => f.write_str("Task(empty)"),
        }
    }
}
