use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Counts work items that have been discovered but not yet finished.
///
/// The producer calls [`reset`](Self::reset) with the total before any item
/// can be finished. Every item then calls [`mark_one`](Self::mark_one) exactly
/// once, whatever its outcome. Until the first reset the count reads as
/// `i64::MAX`, so a waiter that starts early never observes a spurious zero.
#[derive(Debug)]
pub struct CompletionTracker {
    outstanding: Mutex<i64>,
    reached_zero: Condvar,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self {
            outstanding: Mutex::new(i64::MAX),
            reached_zero: Condvar::new(),
        }
    }
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outstanding count. Must happen before the first `mark_one`.
    pub fn reset(&self, total: usize) {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let mut outstanding = self.outstanding.lock();
        *outstanding = total;
        if total <= 0 {
            self.reached_zero.notify_all();
        }
    }

    /// Records one finished item and wakes waiters once nothing is outstanding.
    pub fn mark_one(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding -= 1;
        if *outstanding <= 0 {
            self.reached_zero.notify_all();
        }
    }

    pub fn current(&self) -> i64 {
        *self.outstanding.lock()
    }

    /// Blocks until every item has been marked.
    pub fn wait_until_zero(&self) {
        let mut outstanding = self.outstanding.lock();
        while *outstanding > 0 {
            self.reached_zero.wait(&mut outstanding);
        }
    }

    /// Like [`wait_until_zero`](Self::wait_until_zero) but gives up after
    /// `timeout`. Returns `true` when nothing is outstanding.
    pub fn wait_until_zero_timeout(&self, timeout: Duration) -> bool {
        let mut outstanding = self.outstanding.lock();
        if *outstanding > 0 {
            let _ = self.reached_zero.wait_for(&mut outstanding, timeout);
        }
        *outstanding <= 0
    }
}
