//! Task priority levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority level a task is scheduled on.
///
/// Each level has its own queue and worker threads. Ordering is FIFO within a
/// level; nothing is guaranteed between levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Background work that should not compete with interactive work.
    Low,
    /// Default level.
    #[default]
    Normal,
}

impl TaskPriority {
    /// Both levels, lowest first.
    pub const ALL: [Self; 2] = [Self::Low, Self::Normal];

    /// Lowercase name used in thread names and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
