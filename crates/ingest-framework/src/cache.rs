//! # Bounded LRU Cache
//!
//! [`LruCache`] is a fixed-capacity key/value store with least-recently-used eviction,
//! exposed behind the small [`Cache`] trait so services can be tested against any
//! implementation.
//!
//! ## Layout
//!
//! Entries live in an arena (`Vec<Node>`), linked into a doubly linked recency list by
//! index. A `HashMap` maps each key to its slot. The list front is the most recently
//! used entry, the back the least recently used.
//!
//! Once the arena is full it never grows again: inserting a new key evicts the back
//! entry and reuses its slot in place.
//!
//! ## Concurrency
//!
//! Every operation, including `get`, takes the same exclusive lock: a lookup moves the
//! entry to the front, so it is a writer too. No partially updated state is observable.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capability interface for a bounded cache.
pub trait Cache<K, V>: Send + Sync {
    /// Inserts or updates `key`, marking it most recently used.
    fn set(&self, key: K, value: V);

    /// Returns a copy of the value and marks `key` most recently used.
    fn get(&self, key: &K) -> Option<V>;

    fn len(&self) -> usize;

    fn cap(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Lru<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> Lru<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            capacity,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(h) = self.head {
            self.nodes[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn set(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.touch(idx);
            return;
        }

        if self.nodes.len() < self.capacity {
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.map.insert(key, idx);
            self.push_front(idx);
            return;
        }

        // Full: evict the back entry and reuse its slot.
        let Some(idx) = self.tail else {
            return;
        };
        self.unlink(idx);
        self.map.remove(&self.nodes[idx].key);
        self.nodes[idx].key = key.clone();
        self.nodes[idx].value = value;
        self.map.insert(key, idx);
        self.push_front(idx);
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.nodes[idx].value)
    }

    /// Keys from most to least recently used.
    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(self.nodes[idx].key.clone());
            cursor = self.nodes[idx].next;
        }
        keys
    }
}

/// Thread-safe bounded LRU cache.
pub struct LruCache<K, V> {
    inner: Mutex<Lru<K, V>>,
    capacity: NonZeroUsize,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Lru::new(capacity.get())),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lru<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keys ordered from most to least recently used. Does not change recency.
    pub fn keys(&self) -> Vec<K> {
        self.lock().keys()
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn set(&self, key: K, value: V) {
        self.lock().set(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.lock().map.len()
    }

    fn cap(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache(capacity: usize) -> LruCache<String, i32> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_get_missing() {
        let cache = cache(10);
        assert_eq!(cache.get(&"hello".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get_under_capacity() {
        let cache = cache(10);
        for i in 0..10 {
            cache.set(i.to_string(), i);
        }
        assert_eq!(cache.len(), 10);
        for i in 0..10 {
            assert_eq!(cache.get(&i.to_string()), Some(i));
        }
    }

    #[test]
    fn test_overflow_evicts_least_recently_used() {
        let cache = cache(3);
        for k in ["a", "b", "c", "d"] {
            cache.set(k.to_string(), 0);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.cap(), 3);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.keys(), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_capacity_one() {
        let cache = cache(1);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_promotes_entry() {
        let cache = cache(3);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);

        // "a" becomes most recently used, so "b" is the next victim.
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.set("d".to_string(), 4);

        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.keys(), vec!["a", "d", "c"]);
    }

    #[test]
    fn test_update_existing_key() {
        let cache = cache(3);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("a".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.get(&"a".to_string()), Some(10));
    }

    #[test]
    fn test_recency_after_many_evictions() {
        let cache = cache(2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.get(&"a".to_string());
        cache.set("c".to_string(), 3); // evicts b
        cache.set("b".to_string(), 4); // evicts a
        cache.get(&"c".to_string());
        cache.set("d".to_string(), 5); // evicts b

        assert_eq!(cache.keys(), vec!["d", "c"]);
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn test_concurrent_access_keeps_bound() {
        let cache = Arc::new(cache(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("{t}-{i}");
                        cache.set(key.clone(), i);
                        cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
        assert_eq!(cache.keys().len(), 16);
    }
}
