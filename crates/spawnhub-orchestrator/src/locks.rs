//! Per-label mutual exclusion.
//!
//! Operations on the same service label run one at a time; different labels
//! proceed in parallel. Each map entry counts the holders and waiters using
//! it and is dropped when that count reaches zero, however the acquiring
//! future ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

#[derive(Clone, Default)]
pub struct LabelLocks {
    slots: Slots,
}

impl LabelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `label`.
    ///
    /// Dropping the returned guard, or the pending future, releases it.
    pub async fn acquire(&self, label: &str) -> LabelGuard {
        let lease = Lease::take(&self.slots, label);
        let guard = lease.lock.clone().lock_owned().await;
        LabelGuard {
            _guard: guard,
            lease,
        }
    }

    /// Number of labels currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One registered user of a label's slot, held from the start of `acquire`
/// until the guard is dropped.
struct Lease {
    label: String,
    lock: Arc<AsyncMutex<()>>,
    slots: Slots,
}

impl Lease {
    fn take(slots: &Slots, label: &str) -> Self {
        let mut map = slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = map.entry(label.to_string()).or_insert_with(|| Slot {
            lock: Arc::default(),
            users: 0,
        });
        slot.users += 1;
        Self {
            label: label.to_string(),
            lock: slot.lock.clone(),
            slots: slots.clone(),
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut map = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = map.get_mut(&self.label) {
            slot.users -= 1;
            if slot.users == 0 {
                map.remove(&self.label);
            }
        }
    }
}

/// Exclusive hold on one label.
pub struct LabelGuard {
    // Released before the lease so the next waiter finds the slot intact.
    _guard: OwnedMutexGuard<()>,
    lease: Lease,
}

impl LabelGuard {
    pub fn label(&self) -> &str {
        &self.lease.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_label_is_exclusive() {
        let locks = LabelLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let peak = peak.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire("nb-alice-1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_labels_do_not_block() {
        let locks = LabelLocks::new();
        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn released_labels_are_forgotten() {
        let locks = LabelLocks::new();
        {
            let guard = locks.acquire("nb").await;
            assert_eq!(guard.label(), "nb");
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_entry_alive() {
        let locks = LabelLocks::new();
        let first = locks.acquire("nb").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("nb").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(first);
        assert_eq!(locks.active(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn abandoned_wait_does_not_wedge_the_label() {
        let locks = LabelLocks::new();
        let first = locks.acquire("nb").await;
        let pending = tokio::time::timeout(Duration::from_millis(10), locks.acquire("nb")).await;
        assert!(pending.is_err());
        drop(first);

        let again = tokio::time::timeout(Duration::from_millis(100), locks.acquire("nb")).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn waiter_aborted_after_release_is_forgotten() {
        let locks = LabelLocks::new();
        let holder = locks.acquire("nb").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("nb").await;
                std::future::pending::<()>().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(holder);
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn timed_out_waiters_are_forgotten() {
        let locks = LabelLocks::new();
        let holder = locks.acquire("nb").await;
        for _ in 0..3 {
            let pending = tokio::time::timeout(Duration::from_millis(5), locks.acquire("nb")).await;
            assert!(pending.is_err());
        }
        assert_eq!(locks.active(), 1);
        drop(holder);
        assert_eq!(locks.active(), 0);
    }
}
