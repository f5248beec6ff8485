//! Waiting on, and collecting results from, several tasks at once.
//!
//! A [`TaskGroup`] is either a homogeneous collection (slice, array, `Vec`)
//! of [`Task<T>`], collected into a `Vec<T>`, or a tuple of tasks with
//! arbitrary result types, collected into a tuple of results.
//!
//! ```rust,ignore
//! let mut mixed = (
//!     pool.spawn(|| 1),
//!     pool.submit(TaskPriority::Low, || 2.5_f64),
//! );
//! let (count, scale) = get_all(&mut mixed)?;
//!
//! let mut cells: Vec<Task<u32>> = (0..8).map(|i| pool.spawn(move || i * i)).collect();
//! wait_all(&cells);
//! let squares = get_all(&mut cells)?;
//! ```

use super::error::TaskError;
use super::Task;

/// A fixed set of tasks that can be waited on and consumed together.
pub trait TaskGroup {
    /// Results of every task in the group, in group order.
    type Output;

    /// Block until every task has completed. Tasks no worker has started yet
    /// run on the calling thread, as with [`Task::wait`].
    fn wait_all(&self);

    /// Wait for every task, then take each result in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`TaskError`] in group order. Tasks after it are left
    /// completed but untaken.
    fn get_all(&mut self) -> Result<Self::Output, TaskError>;
}

/// Block until every task in `tasks` has completed.
pub fn wait_all<G: TaskGroup + ?Sized>(tasks: &G) {
    tasks.wait_all();
}

/// Wait for every task in `tasks` and collect their results.
///
/// # Errors
///
/// Returns the first [`TaskError`] in group order.
pub fn get_all<G: TaskGroup + ?Sized>(tasks: &mut G) -> Result<G::Output, TaskError> {
    tasks.get_all()
}

impl<T> TaskGroup for [Task<T>] {
    type Output = Vec<T>;

    fn wait_all(&self) {
        for task in self {
            task.wait();
        }
    }

    fn get_all(&mut self) -> Result<Self::Output, TaskError> {
        self.wait_all();
        self.iter_mut().map(Task::get).collect()
    }
}

impl<T, const N: usize> TaskGroup for [Task<T>; N] {
    type Output = Vec<T>;

    fn wait_all(&self) {
        self.as_slice().wait_all();
    }

    fn get_all(&mut self) -> Result<Self::Output, TaskError> {
        self.as_mut_slice().get_all()
    }
}

impl<T> TaskGroup for Vec<Task<T>> {
    type Output = Vec<T>;

    fn wait_all(&self) {
        self.as_slice().wait_all();
    }

    fn get_all(&mut self) -> Result<Self::Output, TaskError> {
        self.as_mut_slice().get_all()
    }
}

impl<T> TaskGroup for Task<T> {
    type Output = T;

    fn wait_all(&self) {
        self.wait();
    }

    fn get_all(&mut self) -> Result<Self::Output, TaskError> {
        self.get()
    }
}

macro_rules! impl_task_group_for_tuple {
    ($($task:ident: $value:ident),+) => {
        impl<$($value),+> TaskGroup for ($(Task<$value>,)+) {
            type Output = ($($value,)+);

            fn wait_all(&self) {
                let ($($task,)+) = self;
                $($task.wait();)+
            }

            fn get_all(&mut self) -> Result<Self::Output, TaskError> {
                self.wait_all();
                let ($($task,)+) = self;
                Ok(($($task.get()?,)+))
            }
        }
    };
}

impl_task_group_for_tuple!(t0: A);
impl_task_group_for_tuple!(t0: A, t1: B);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G, t7: H);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G, t7: H, t8: I);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G, t7: H, t8: I, t9: J);
impl_task_group_for_tuple!(t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G, t7: H, t8: I, t9: J, t10: K);
impl_task_group_for_tuple!(
    t0: A, t1: B, t2: C, t3: D, t4: E, t5: F, t6: G, t7: H, t8: I, t9: J, t10: K, t11: L
);
