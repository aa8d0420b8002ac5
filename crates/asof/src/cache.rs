//! Memoization cells for the reader facade.
//!
//! Both caches hold their lock while an entry is being built, so each value
//! is built at most once even under concurrent access. A failed build
//! leaves the cache unchanged and the next call retries.

use crate::error::{ReaderError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A lazily built, shared value.
#[derive(Debug)]
pub struct Memo<T> {
    cell: Mutex<Option<Arc<T>>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Memo<T> {
    /// An empty cell.
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    /// The cached value, building it with `init` on first use.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut cell = self.cell.lock().map_err(|_| ReaderError::LockPoisoned)?;
        if let Some(value) = cell.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *cell = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Whether the value has been built.
    pub fn is_initialized(&self) -> bool {
        self.cell.lock().is_ok_and(|cell| cell.is_some())
    }
}

/// Keyed cache holding at most `capacity` entries, evicting the least
/// recently used.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    // Front is least recently used.
    entries: Mutex<VecDeque<(K, Arc<V>)>>,
}

impl<K: PartialEq, V> BoundedCache<K, V> {
    /// A cache for at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .lock()
            .is_ok_and(|entries| entries.iter().any(|(k, _)| k == key))
    }

    /// The value for `key`, building it with `init` on a miss.
    pub fn get_or_try_init<F>(&self, key: K, init: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let mut entries = self.entries.lock().map_err(|_| ReaderError::LockPoisoned)?;
        if let Some(pos) = entries.iter().position(|(k, _)| *k == key)
            && let Some(entry) = entries.remove(pos)
        {
            let value = Arc::clone(&entry.1);
            entries.push_back(entry);
            return Ok(value);
        }

        let value = Arc::new(init()?);
        entries.push_back((key, Arc::clone(&value)));
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(value)
    }
}
