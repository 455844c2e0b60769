use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::{SecureStore, StoreError};

/// In-process store, used by tests and for runs that must not persist
/// anything.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, seeded with `items`.
    pub fn read_only<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        let store = Self::with_items(items);
        MemoryStore {
            read_only: true,
            ..store
        }
    }

    pub fn with_items<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        let items = items.into_iter().map(|(k, v)| (k.into(), v)).collect();
        MemoryStore {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    /// Keys passed to successful `set` calls, in call order.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.items).get(key).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set(&self, key: &str, data: &[u8], _label: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::write(key, "store is read-only"));
        }

        lock(&self.items).insert(key.to_string(), data.to_vec());
        lock(&self.writes).push(key.to_string());
        Ok(())
    }
}
