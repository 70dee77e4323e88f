//! Per-client memoization.
//!
//! These caches use interior mutability without locking, so a client holding them is not `Sync`.
//! Share a client between threads by wrapping it in your own lock.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// A map whose entries are computed on first access and never invalidated.
///
/// A failed computation leaves no entry behind, so the next lookup tries again.
#[derive(Debug)]
pub(crate) struct MemoCache<K, V> {
    entries: RefCell<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> MemoCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).cloned()
    }

    /// Return the cached value for `key`, computing and storing it first if absent.
    ///
    /// No borrow is held while `compute` runs.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.entries
            .borrow_mut()
            .entry(key.clone())
            .or_insert(value.clone());
        Ok(value)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A value assigned at most once, on first successful computation.
#[derive(Debug, Default)]
pub(crate) struct Lazy<V> {
    cell: OnceCell<V>,
}

impl<V: Clone> Lazy<V> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<V> {
        self.cell.get().cloned()
    }

    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let value = init()?;
        Ok(self.cell.get_or_init(|| value).clone())
    }
}
