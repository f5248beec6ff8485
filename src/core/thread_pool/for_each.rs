//! Parallel-for over an index range.
//!
//! The range is cut into one chunk per worker (plus one for the pool's
//! creation thread, which participates). All chunks of one call live in a
//! single `Arc`'d batch; queue entries address a chunk by slot index, so
//! submitting a chunk allocates nothing per chunk.

use std::any::Any;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::ThreadPool;
use crate::core::error::TaskError;
use crate::core::record::{Job, TaskId, TaskState};
use crate::core::TaskPriority;

/// One contiguous piece of the index range.
struct Chunk {
    state: TaskState,
    range: Range<usize>,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

/// Every chunk of one `submit_indexed` call plus the shared callable.
struct IndexedBatch<F> {
    func: F,
    chunks: Box<[Chunk]>,
}

impl<F> IndexedBatch<F>
where
    F: Fn(usize) + Send + Sync,
{
    fn new(func: F, ranges: Vec<Range<usize>>) -> Self {
        let chunks = ranges
            .into_iter()
            .map(|range| Chunk {
                state: TaskState::new(),
                range,
                panic: Mutex::new(None),
            })
            .collect();
        Self { func, chunks }
    }

    /// Block until `slot` is complete, running it here if nobody has started it.
    /// Returns whether this call ran it.
    fn join_slot(&self, slot: usize) -> bool {
        if self.run_if_unclaimed(slot) {
            return true;
        }
        self.chunks[slot].state.wait_complete();
        false
    }

    /// The panic of the lowest chunk that panicked, if any.
    fn take_first_panic(&self) -> Option<Box<dyn Any + Send>> {
        self.chunks.iter().find_map(|chunk| chunk.panic.lock().take())
    }
}

impl<F> Job for IndexedBatch<F>
where
    F: Fn(usize) + Send + Sync,
{
    fn run_if_unclaimed(&self, slot: usize) -> bool {
        let Some(chunk) = self.chunks.get(slot) else {
            return false;
        };
        if !chunk.state.try_claim() {
            return false;
        }

        let range = chunk.range.clone();
        let result = catch_unwind(AssertUnwindSafe(|| {
            for index in range {
                (self.func)(index);
            }
        }));
        if let Err(payload) = result {
            *chunk.panic.lock() = Some(payload);
        }

        chunk.state.complete();
        true
    }
}

/// Split `0..size` into at most `desired_task_count + 1` ranges.
///
/// With `size <= desired_task_count` every index gets its own range.
/// Otherwise there are `desired_task_count` equal ranges followed by one
/// remainder range when `size` does not divide evenly.
pub(crate) fn partition(size: usize, desired_task_count: usize) -> Vec<Range<usize>> {
    let desired_task_count = desired_task_count.max(1);

    if size <= desired_task_count {
        return (0..size).map(|i| i..i + 1).collect();
    }

    let work_size = size / desired_task_count;
    let split_end = desired_task_count * work_size;

    let mut ranges: Vec<Range<usize>> = (0..desired_task_count)
        .map(|i| i * work_size..(i + 1) * work_size)
        .collect();
    if split_end != size {
        ranges.push(split_end..size);
    }
    ranges
}

impl ThreadPool {
    /// How many chunks a parallel-for on `priority` aims for from this thread.
    #[must_use]
    pub fn desired_task_count(&self, priority: TaskPriority) -> usize {
        self.thread_count(priority).max(1) + usize::from(self.is_creator_thread())
    }

    /// Call `func(i)` for every `i` in `0..size`, spread over the level's workers.
    ///
    /// The calling thread runs the last chunk itself and then helps with any
    /// chunk no worker has picked up yet. Returns once every index has been
    /// processed.
    ///
    /// `func` must be `'static`: queue entries may outlive this call for a
    /// moment after it returns, so the callable cannot borrow from the
    /// caller's stack. Move shared data in instead, typically behind an `Arc`:
    ///
    /// ```rust,ignore
    /// let heights: Arc<[AtomicU32]> = heights.into();
    /// let cells = Arc::clone(&heights);
    /// pool.submit_indexed(TaskPriority::Normal, heights.len(), move |i| {
    ///     cells[i].fetch_add(1, Ordering::Relaxed);
    /// })?;
    /// ```
    ///
    /// # Errors
    ///
    /// If `func` panicked, every other chunk still runs to completion and the
    /// panic of the lowest-ordered failing chunk is returned as
    /// [`TaskError::Panicked`].
    pub fn submit_indexed<F>(
        &self,
        priority: TaskPriority,
        size: usize,
        func: F,
    ) -> Result<(), TaskError>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        if size == 0 {
            return Ok(());
        }

        let ranges = partition(size, self.desired_task_count(priority));
        let chunk_count = ranges.len();
        let batch_id: TaskId = self.next_id();
        let batch = Arc::new(IndexedBatch::new(func, ranges));
        let level = self.level(priority);
        let last = chunk_count - 1;

        debug!(batch_id, %priority, size, chunk_count, "parallel-for started");

        if !self.runs_inline(level) {
            let job = Arc::downgrade(&batch) as Weak<dyn Job>;
            for slot in 0..last {
                level.enqueue(batch_id, slot, job.clone());
            }
        }

        // The caller is the extra worker: it takes the last chunk, which was never queued.
        if batch.run_if_unclaimed(last) {
            level.counters.executed_inline.fetch_add(1, Ordering::Relaxed);
        }

        for slot in (0..last).rev() {
            if batch.join_slot(slot) {
                trace!(batch_id, slot, "chunk executed by caller");
                level.record_inline_slot(batch_id, slot);
            }
        }

        debug!(batch_id, "parallel-for finished");

        match batch.take_first_panic() {
            Some(payload) => Err(TaskError::from_panic(payload)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(ranges: &[Range<usize>]) -> Vec<usize> {
        ranges.iter().flat_map(Clone::clone).collect()
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_partition_one_per_index_when_small() {
        let ranges = partition(3, 8);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);

        let ranges = partition(6, 6);
        assert_eq!(ranges.len(), 6);
    }

    #[test]
    fn test_partition_even_split() {
        let ranges = partition(100, 4);
        assert_eq!(ranges, vec![0..25, 25..50, 50..75, 75..100]);
    }

    #[test]
    fn test_partition_remainder_chunk() {
        let ranges = partition(10, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);
        assert_eq!(covered(&ranges), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_zero_desired_treated_as_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_batch_chunk_runs_once() {
        use std::sync::atomic::AtomicUsize;

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let batch = IndexedBatch::new(
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            partition(10, 2),
        );

        assert!(batch.run_if_unclaimed(0));
        assert!(!batch.run_if_unclaimed(0));
        assert!(!batch.join_slot(0));
        assert!(batch.join_slot(1));
        assert!(!batch.run_if_unclaimed(2));

        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert!(batch.take_first_panic().is_none());
    }

    #[test]
    fn test_batch_keeps_first_panic() {
        let batch = IndexedBatch::new(
            |i| {
                assert!(i % 5 != 0, "index {i} failed");
            },
            partition(10, 2),
        );

        batch.join_slot(1);
        batch.join_slot(0);

        let err = TaskError::from_panic(batch.take_first_panic().unwrap());
        assert_eq!(err.panic_message(), Some("index 0 failed"));
    }
}
