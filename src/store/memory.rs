//! Volatile in-memory store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::{ProxyStore, ProxyUrl, StoreError};

/// A `HashMap` guarded by one lock for the whole map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    proxies: Mutex<HashMap<String, ProxyUrl>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are independent; a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProxyUrl>> {
        self.proxies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProxyStore for InMemoryStore {
    fn get(&self, hostname: &str) -> Result<Option<ProxyUrl>, StoreError> {
        Ok(self.lock().get(hostname).cloned())
    }

    fn get_all(&self) -> Result<Vec<ProxyUrl>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }

    fn set(&self, hostname: &str, proxy: ProxyUrl) -> Result<(), StoreError> {
        self.lock().insert(hostname.to_owned(), proxy);
        Ok(())
    }

    fn insert_new(&self, hostname: &str, proxy: ProxyUrl) -> Result<bool, StoreError> {
        match self.lock().entry(hostname.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(proxy);
                Ok(true)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
