//! Task scheduling, task handles and cancellation.

pub mod error;
pub mod group;
pub mod priority;
pub mod task;
pub mod thread_pool;

mod latch;
mod record;

pub use error::{AppResult, PoolError, TaskError};
pub use group::{get_all, wait_all, TaskGroup};
pub use priority::TaskPriority;
pub use record::{TaskId, TaskStatus};
pub use task::Task;
pub use thread_pool::{LevelStats, ThreadPool};
