//! Per-key exclusive scopes
//!
//! Every read-compute-write sequence on a projector or config key runs while
//! holding the guard for that key, so concurrent requests on the same record
//! are applied one after the other and never lose updates.
//!
//! A key only occupies the map while a guard for it is held or awaited.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = HashMap<K, Arc<Mutex<()>>>;

/// Lazily created async mutex per key
#[derive(Debug)]
pub struct KeyedLocks<K> {
    // Never held across an await
    locks: Arc<SyncMutex<LockMap<K>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(SyncMutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &K) -> KeyGuard<K> {
        let lock = {
            let mut locks = lock_map(&self.locks);
            // Entries left behind by cancelled waiters
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        let held = lock.lock_owned().await;
        KeyGuard {
            key: key.clone(),
            locks: self.locks.clone(),
            held: Some(held),
        }
    }

    /// Number of keys currently locked or awaited
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_map<K>(locks: &SyncMutex<LockMap<K>>) -> MutexGuard<'_, LockMap<K>> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive access to one key, released on drop
#[derive(Debug)]
pub struct KeyGuard<K: Eq + Hash> {
    key: K,
    locks: Arc<SyncMutex<LockMap<K>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        // Release first so only the map's reference can remain
        drop(self.held.take());
        let mut locks = lock_map(&self.locks);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
