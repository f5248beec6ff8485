//! Thread pool configuration.

use std::env;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, TaskPriority};

/// Upper bound on worker threads per level.
pub const MAX_THREADS_PER_LEVEL: usize = 1024;

/// Smallest accepted explicit worker stack size, in bytes.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Environment variable for [`ThreadPoolConfig::thread_count`].
pub const ENV_THREAD_COUNT: &str = "TASK_POOL_THREADS";
/// Environment variable for [`ThreadPoolConfig::low_priority_thread_count`].
pub const ENV_LOW_PRIORITY_THREAD_COUNT: &str = "TASK_POOL_LOW_PRIORITY_THREADS";
/// Environment variable for [`ThreadPoolConfig::thread_name_prefix`].
pub const ENV_THREAD_NAME_PREFIX: &str = "TASK_POOL_THREAD_NAME_PREFIX";
/// Environment variable for [`ThreadPoolConfig::stack_size`].
pub const ENV_STACK_SIZE: &str = "TASK_POOL_STACK_SIZE";

/// Worker thread configuration for a [`ThreadPool`](crate::core::ThreadPool).
///
/// Either count may be zero, in which case every submission on that level
/// runs synchronously on the submitting thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadPoolConfig {
    /// Worker threads for [`TaskPriority::Normal`].
    pub thread_count: usize,
    /// Worker threads for [`TaskPriority::Low`].
    pub low_priority_thread_count: usize,
    /// Prefix for worker thread names (`<prefix>-<level>-<index>`).
    pub thread_name_prefix: String,
    /// Explicit worker stack size in bytes; `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    /// Leaves one CPU for the creating thread, which joins in on parallel-for.
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            thread_count: cpus.saturating_sub(1).max(1),
            low_priority_thread_count: (cpus / 2).max(1),
            thread_name_prefix: "task-pool".into(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    /// Defaults sized from the number of available CPUs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// No worker threads at all: everything runs on the submitting thread.
    #[must_use]
    pub fn synchronous() -> Self {
        Self {
            thread_count: 0,
            low_priority_thread_count: 0,
            ..Self::default()
        }
    }

    /// Set the normal priority worker count.
    #[must_use]
    pub const fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Set the low priority worker count.
    #[must_use]
    pub const fn with_low_priority_thread_count(mut self, count: usize) -> Self {
        self.low_priority_thread_count = count;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set an explicit worker stack size in bytes.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Worker count configured for a level.
    #[must_use]
    pub const fn threads_for(&self, priority: TaskPriority) -> usize {
        match priority {
            TaskPriority::Low => self.low_priority_thread_count,
            TaskPriority::Normal => self.thread_count,
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        for priority in TaskPriority::ALL {
            let count = self.threads_for(priority);
            if count > MAX_THREADS_PER_LEVEL {
                return Err(format!(
                    "{priority} priority thread count {count} exceeds {MAX_THREADS_PER_LEVEL}"
                ));
            }
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if let Some(stack_size) = self.stack_size {
            if stack_size < MIN_STACK_SIZE {
                return Err(format!(
                    "stack_size {stack_size} is below the minimum of {MIN_STACK_SIZE} bytes"
                ));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their default values.
    ///
    /// # Errors
    ///
    /// Returns a message if the JSON is malformed or the values are invalid.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `TASK_POOL_*` environment variables, loading a
    /// `.env` file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable cannot be parsed or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(count) = env_var::<usize>(ENV_THREAD_COUNT)? {
            cfg.thread_count = count;
        }
        if let Some(count) = env_var::<usize>(ENV_LOW_PRIORITY_THREAD_COUNT)? {
            cfg.low_priority_thread_count = count;
        }
        if let Some(prefix) = env_var::<String>(ENV_THREAD_NAME_PREFIX)? {
            cfg.thread_name_prefix = prefix;
        }
        if let Some(bytes) = env_var::<usize>(ENV_STACK_SIZE)? {
            cfg.stack_size = Some(bytes);
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn env_var<T>(name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value {raw:?} for {name}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("cannot read {name}")),
    }
}
