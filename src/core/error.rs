//! Error types for pool construction and task execution.

use std::any::Any;
use std::io;

use thiserror::Error;

use crate::core::TaskPriority;

/// Errors produced while building or configuring a [`ThreadPool`](crate::core::ThreadPool).
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn {priority} priority worker #{index}: {source}")]
    Spawn {
        /// Level the worker was meant to serve.
        priority: TaskPriority,
        /// Index of the worker within its level.
        index: usize,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Failure surfaced by [`Task::get`](crate::core::Task::get) and
/// [`ThreadPool::submit_indexed`](crate::core::ThreadPool::submit_indexed).
#[derive(Debug, Error)]
pub enum TaskError {
    /// The callable panicked. The original payload is kept so it can be re-raised.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic message, if the payload was a string.
        message: String,
        /// The payload captured by `catch_unwind`.
        payload: Box<dyn Any + Send>,
    },
    /// The blocking join used by the async bridge could not complete.
    #[error("blocking join failed: {0}")]
    Join(String),
}

impl TaskError {
    /// Wrap a payload captured by `std::panic::catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = panic_message(payload.as_ref());
        Self::Panicked { message, payload }
    }

    /// Message of the original panic, if this error came from one.
    #[must_use]
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Self::Panicked { message, .. } => Some(message),
            Self::Join(_) => None,
        }
    }

    /// Continue unwinding with the original panic payload.
    ///
    /// Errors that did not originate from a panic are raised as a new panic
    /// carrying their display text.
    pub fn resume_unwind(self) -> ! {
        match self {
            Self::Panicked { payload, .. } => std::panic::resume_unwind(payload),
            other => std::panic::resume_unwind(Box::new(other.to_string())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Report a misuse of a task handle and terminate the process.
///
/// Double `get`, or any use of a consumed, canceled or empty handle, is a
/// logic bug in the caller and is never turned into a recoverable error.
#[cold]
pub(crate) fn contract_violation(operation: &'static str, detail: &'static str) -> ! {
    tracing::error!(operation, detail, "task handle contract violated, aborting");
    eprintln!("prometheus_thread_pool: {operation}: {detail}");
    std::process::abort()
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_payload() {
        let err = TaskError::from_panic(Box::new("boom"));
        assert_eq!(err.panic_message(), Some("boom"));
        assert_eq!(format!("{err}"), "task panicked: boom");
    }

    #[test]
    fn test_panic_message_from_string_payload() {
        let err = TaskError::from_panic(Box::new(String::from("formatted 7")));
        assert_eq!(err.panic_message(), Some("formatted 7"));
    }

    #[test]
    fn test_panic_message_from_opaque_payload() {
        let err = TaskError::from_panic(Box::new(42_u32));
        assert_eq!(err.panic_message(), Some("unknown panic payload"));
    }

    #[test]
    fn test_resume_unwind_keeps_payload() {
        let err = TaskError::from_panic(Box::new(17_i32));
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| err.resume_unwind()))
            .unwrap_err();
        assert_eq!(caught.downcast_ref::<i32>(), Some(&17));
    }

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::InvalidConfig("thread_name_prefix must not be empty".into());
        assert_eq!(
            format!("{err}"),
            "invalid configuration: thread_name_prefix must not be empty"
        );

        let err = PoolError::Spawn {
            priority: TaskPriority::Low,
            index: 3,
            source: io::Error::other("out of threads"),
        };
        assert_eq!(
            format!("{err}"),
            "failed to spawn low priority worker #3: out of threads"
        );
    }
}
