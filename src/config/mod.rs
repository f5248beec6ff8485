//! Configuration models for the thread pool.

pub mod pool;

pub use pool::{ThreadPoolConfig, MAX_THREADS_PER_LEVEL, MIN_STACK_SIZE};
