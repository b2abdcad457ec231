use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};

/// Mutable key-value map guarded by a single exclusive lock.
///
/// Callers obtain a [`StoreGuard`] for the duration of one operation; no
/// mutation is visible to other threads until the guard is dropped.
#[derive(Debug, Default)]
pub struct Store {
    entries: Mutex<HashMap<String, String>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the store lock for one operation.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            entries: self.entries.lock(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Point-in-time copy of the contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }
}

/// Exclusive access to the store for the lifetime of the guard.
pub struct StoreGuard<'a> {
    entries: MutexGuard<'a, HashMap<String, String>>,
}

impl StoreGuard<'_> {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn set(&mut self, key: &str, value: String) -> Option<String> {
        self.entries.insert(key.to_string(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let store = Store::new();
        {
            let mut guard = store.lock();
            assert_eq!(guard.set("a", "1".to_string()), None);
            assert_eq!(guard.set("a", "2".to_string()), Some("1".to_string()));
            assert_eq!(guard.get("a"), Some("2"));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_missing_key() {
        let store = Store::new();
        assert_eq!(store.lock().remove("ghost"), None);
        assert!(store.is_empty());
    }
}
