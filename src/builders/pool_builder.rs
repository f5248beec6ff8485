//! Builders to construct thread pools from configuration sources.

use anyhow::Context;
use tracing::debug;

use crate::config::ThreadPoolConfig;
use crate::core::{AppResult, PoolError, ThreadPool};

/// Build a pool from an in-memory configuration.
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` or `PoolError::Spawn`.
pub fn build_pool(cfg: &ThreadPoolConfig) -> Result<ThreadPool, PoolError> {
    debug!(
        thread_count = cfg.thread_count,
        low_priority_thread_count = cfg.low_priority_thread_count,
        "building thread pool"
    );
    ThreadPool::new(cfg.clone())
}

/// Build a pool from a JSON document (see [`ThreadPoolConfig::from_json_str`]).
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if the document does not parse or
/// validate, or `PoolError::Spawn` if a worker cannot be started.
pub fn build_pool_from_json(input: &str) -> Result<ThreadPool, PoolError> {
    let cfg = ThreadPoolConfig::from_json_str(input).map_err(PoolError::InvalidConfig)?;
    build_pool(&cfg)
}

/// Build a pool from `TASK_POOL_*` environment variables.
///
/// # Errors
///
/// Fails if the environment holds invalid values or a worker cannot be started.
pub fn build_pool_from_env() -> AppResult<ThreadPool> {
    let cfg = ThreadPoolConfig::from_env().context("loading thread pool configuration")?;
    build_pool(&cfg).context("starting thread pool")
}
