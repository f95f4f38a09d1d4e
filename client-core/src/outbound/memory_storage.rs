//! In-memory key-value storage adapter.
//!
//! Stands in for browser local and session storage in native builds and
//! tests. A WASM build would add a web-storage adapter behind the same
//! port.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::KeyValueStore;

/// Thread-safe in-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock_entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock_entries().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    fn clear(&self) {
        self.lock_entries().clear();
    }
}
