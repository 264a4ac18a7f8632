//! Per-key async locks.
//!
//! Holders of the same key run one at a time; distinct keys never contend.
//! An entry lives only while someone holds or waits for it, including
//! waiters that are cancelled before they get the lock.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = DashMap<K, Arc<Mutex<()>>>;

/// Map of key to async mutex.
pub struct KeyedLocks<K: Eq + Hash> {
    locks: Arc<LockMap<K>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard owns its handle on the map, so it can be moved
    /// into a spawned task and outlive the borrow of `self`.
    pub async fn lock(&self, key: K) -> KeyedGuard<K> {
        let mutex = Arc::clone(&self.locks.entry(key.clone()).or_default());

        // Built before waiting: if this future is dropped mid-wait, the
        // guard's drop still prunes the entry.
        let mut held = KeyedGuard {
            key,
            locks: Arc::clone(&self.locks),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key; released on drop.
///
/// Also created, unlocked, while a task waits in [`KeyedLocks::lock`].
pub struct KeyedGuard<K: Eq + Hash> {
    key: K,
    locks: Arc<LockMap<K>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        // Release before pruning so the map's Arc is the last one left
        // unless another task holds or waits for the key.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
