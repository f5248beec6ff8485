//! # Prometheus Thread Pool
//!
//! A priority-aware thread pool for the CPU-heavy background work of an
//! interactive application: geometry generation, spatial index construction,
//! bulk array resampling.
//!
//! ## Key Features
//!
//! - **Two priority levels**: `Low` and `Normal`, each with its own FIFO queue
//!   and dedicated worker threads
//! - **Owning task handles**: dropping an unfinished [`Task`](core::Task)
//!   cancels it; a running task is waited for, so borrowed state can be freed
//! - **Exactly-once execution**: a worker, a waiting caller (direct execution)
//!   and a canceling caller race on one compare-and-set; only the winner acts
//! - **Panic propagation**: a panicking callable is surfaced once through
//!   [`Task::get`](core::Task::get) as [`TaskError::Panicked`](core::TaskError)
//! - **Parallel-for**: [`ThreadPool::submit_indexed`](core::ThreadPool::submit_indexed)
//!   splits an index range across the workers, with the calling thread helping
//! - **Task groups**: [`wait_all`](core::wait_all) and [`get_all`](core::get_all)
//!   over slices, arrays, `Vec`s and tuples of tasks with mixed result types
//! - **Synchronous fallback**: a level with zero threads runs submissions inline
//!
//! Not an async I/O runtime, not a dependency-graph scheduler, and there are
//! no timeouts: callables run to completion once started.
//!
//! ```rust,ignore
//! use prometheus_thread_pool::config::ThreadPoolConfig;
//! use prometheus_thread_pool::core::{TaskPriority, ThreadPool};
//!
//! let pool = ThreadPool::new(
//!     ThreadPoolConfig::new()
//!         .with_thread_count(4)
//!         .with_low_priority_thread_count(2),
//! )?;
//!
//! let mut bounds = pool.submit(TaskPriority::Low, move || compute_bounds(&mesh));
//!
//! let heights = Arc::new(heights);
//! let resampled = Arc::clone(&heights);
//! pool.submit_indexed(TaskPriority::Normal, heights.len(), move |i| resampled.resample(i))?;
//!
//! let bounds = bounds.get()?;
//! ```
//!
//! Misusing a handle (calling `get` twice, or using a canceled or empty
//! handle) is a logic bug and aborts the process.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Task handles, the thread pool and its priority levels.
pub mod core;
/// Configuration models for the pool.
pub mod config;
/// Builders to construct pools from configuration sources.
pub mod builders;
/// Shared utilities.
pub mod util;

pub use crate::config::ThreadPoolConfig;
pub use crate::core::{get_all, wait_all, Task, TaskError, TaskGroup, TaskPriority, ThreadPool};
