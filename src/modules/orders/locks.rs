//! Per-user serialization of order placement.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user currently placing an order. Each slot counts the
/// holder and waiters registered on it and is removed when the count drops to
/// zero, so the map only holds users with a placement in flight.
#[derive(Clone, Default)]
pub struct PlacementLocks {
    inner: Arc<DashMap<i64, Slot>>,
}

#[derive(Default)]
struct Slot {
    lock: Arc<Mutex<()>>,
    holders: usize,
}

impl PlacementLocks {
    /// Wait until no other placement for `user_id` is running.
    ///
    /// Cancel safe: dropping the future while it waits releases its claim on
    /// the slot.
    pub async fn acquire(&self, user_id: i64) -> PlacementGuard {
        let lock = {
            let mut slot = self.inner.entry(user_id).or_default();
            slot.holders += 1;
            slot.lock.clone()
        };
        let mut guard = PlacementGuard {
            locks: self.inner.clone(),
            user_id,
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.inner.len()
    }
}

/// Held for the duration of a placement. Also dropped unfilled when an
/// `acquire` is cancelled while waiting.
pub struct PlacementGuard {
    locks: Arc<DashMap<i64, Slot>>,
    user_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PlacementGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.remove_if_mut(&self.user_id, |_, slot| {
            slot.holders -= 1;
            slot.holders == 0
        });
    }
}
