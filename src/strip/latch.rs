use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Count-down latch over a fixed number of draws.
///
/// Opens when the count reaches zero, whatever order the draws finish in.
/// Exactly one `count_down` call observes the transition.
pub struct DrawLatch {
    remaining: AtomicUsize,
    open: AtomicBool,
    notify: Notify,
}

impl DrawLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            open: AtomicBool::new(count == 0),
            notify: Notify::new(),
        }
    }

    /// Record one finished draw. Returns `true` for the call that opened the
    /// latch; extra calls after that are ignored.
    pub fn count_down(&self) -> bool {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                self.open.store(true, Ordering::Release);
                self.notify.notify_waiters();
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Wait until every draw has counted down.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_open() {
                return;
            }
            notified.await;
        }
    }
}

/// Counts the latch down when dropped, so a draw that panics or bails out
/// early still releases its slot.
pub struct CountDownGuard {
    latch: Arc<DrawLatch>,
}

impl CountDownGuard {
    pub fn new(latch: Arc<DrawLatch>) -> Self {
        Self { latch }
    }
}

impl Drop for CountDownGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
