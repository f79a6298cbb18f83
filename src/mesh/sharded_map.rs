// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::hash::{BuildHasher, Hash};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::{AHashMap, RandomState};

// A poisoned lock means another worker already panicked; the panic is what
// gets reported, so the guard is recovered instead of stacking a second one.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn get_mut<T>(l: &mut RwLock<T>) -> &mut T {
    l.get_mut().unwrap_or_else(PoisonError::into_inner)
}

/// Lock-striped hash map. Every operation locks exactly one shard.
pub struct ShardedMap<K, V> {
    shards: Box<[Mutex<AHashMap<K, V>>]>,
    hasher: RandomState,
}

impl<K: Hash + Eq, V: Clone> ShardedMap<K, V> {
    pub fn new(num_shards: usize) -> Self {
        let n = num_shards.max(1);
        ShardedMap {
            shards: (0..n).map(|_| Mutex::new(AHashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    /// One shard per available thread, times four.
    pub fn for_current_pool() -> Self {
        Self::new(rayon::current_num_threads() * 4)
    }

    fn shard(&self, key: &K) -> &Mutex<AHashMap<K, V>> {
        let h = self.hasher.hash_one(key);
        &self.shards[(h % self.shards.len() as u64) as usize]
    }

    pub fn get(&self, key: &K) -> Option<V> {
        lock(self.shard(key)).get(key).cloned()
    }

    /// Returns the value stored for `key`, inserting `make()` if absent. The
    /// flag is `true` when this call inserted. `make` runs under the shard
    /// lock, so concurrent callers on the same key see one winner.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&self, key: K, make: F) -> (V, bool) {
        let mut shard = lock(self.shard(&key));
        if let Some(v) = shard.get(&key) {
            return (v.clone(), false);
        }
        let v = make();
        shard.insert(key, v.clone());
        (v, true)
    }

    /// Inserts unless present; returns `true` on insertion.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        self.get_or_insert_with(key, || value).1
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        lock(self.shard(key)).remove(key)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| lock(s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_insert_wins() {
        let map: ShardedMap<u32, u32> = ShardedMap::new(4);
        assert_eq!(map.get_or_insert_with(7, || 1), (1, true));
        assert_eq!(map.get_or_insert_with(7, || 2), (1, false));
        assert_eq!(map.get(&7), Some(1));
        assert_eq!(map.remove(&7), Some(1));
        assert!(map.is_empty());
    }

    #[test]
    fn racing_callers_converge() {
        let map: ShardedMap<u32, usize> = ShardedMap::new(8);
        let created = AtomicUsize::new(0);
        let seen: Vec<usize> = (0..256)
            .into_par_iter()
            .map(|i| {
                map.get_or_insert_with(i % 4, || created.fetch_add(1, Ordering::SeqCst))
                    .0
            })
            .collect();

        assert_eq!(created.load(Ordering::SeqCst), 4);
        assert_eq!(map.len(), 4);
        for (i, v) in seen.iter().enumerate() {
            assert_eq!(Some(*v), map.get(&((i % 4) as u32)));
        }
    }
}
