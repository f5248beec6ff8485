//! One-shot completion signal.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// A latch that opens once and stays open.
///
/// `is_set` is a lock-free check; `wait` parks on a Condvar until `set` is
/// called. There is no timeout support.
#[derive(Debug, Default)]
pub(crate) struct CompletionLatch {
    /// Fast-path flag, mirrors `opened` once set.
    set: AtomicBool,
    opened: Mutex<bool>,
    condvar: Condvar,
}

impl CompletionLatch {
    pub(crate) fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }

    /// Open the latch and wake every waiter. Setting twice is harmless.
    pub(crate) fn set(&self) {
        let mut opened = self.opened.lock();
        *opened = true;
        self.set.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Block until the latch is open.
    pub(crate) fn wait(&self) {
        if self.is_set() {
            return;
        }

        let mut opened = self.opened.lock();
        while !*opened {
            self.condvar.wait(&mut opened);
        }
    }
}
