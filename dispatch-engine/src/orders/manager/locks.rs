//! Per-order command serialization
//!
//! A command reads the snapshot, may await the vision service, then writes a
//! patch diffed against that snapshot. Two commands on the same order must not
//! interleave, or the later patch overwrites the earlier one's history.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

#[derive(Default)]
pub(super) struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl OrderLocks {
    /// Wait for exclusive access to `order_id`
    pub(super) async fn lock(self: &Arc<Self>, order_id: &str) -> OrderGuard {
        let lock = self
            .locks
            .lock()
            .entry(order_id.to_string())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;
        OrderGuard {
            owner: self.clone(),
            order_id: order_id.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Held for the whole command; the map entry goes away with the last holder
pub(super) struct OrderGuard {
    owner: Arc<OrderLocks>,
    order_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OrderGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.owner.locks.lock();
        // 只剩 map 自身持有时才移除
        if locks
            .get(&self.order_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.order_id);
        }
    }
}
