//! Quiescence detection: counts nodes enqueued minus nodes finished.
//! Termination occurs the instant this reaches zero.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone)]
pub struct PendingCounter {
    count: Arc<AtomicI64>,
    notify: Arc<Notify>,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicI64::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Must be called before the corresponding node is handed to the input
    /// channel.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Must be called on every exit path: depth drop, duplicate drop, query
    /// success, query failure.
    pub fn decrement(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    pub fn get(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Blocks until the counter reaches zero. Safe to call even if it is
    /// already zero by the time this is invoked, since the check happens
    /// after registering interest.
    pub async fn wait_for_zero(&self) {
        loop {
            let notified = self.notify.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
        }
    }
}

impl Default for PendingCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reaches_zero_after_matched_inc_dec() {
        let pending = PendingCounter::new();
        pending.increment();
        pending.increment();
        assert_eq!(pending.get(), 2);
        pending.decrement();
        pending.decrement();
        assert_eq!(pending.get(), 0);
        pending.wait_for_zero().await;
    }
}
