use std::collections::HashMap;
use std::sync::Mutex;

use tg_core::ports::{KeyValueStorePort, KvStoreError};

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorePort for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| KvStoreError::Unavailable("storage lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvStoreError::Unavailable("storage lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvStoreError::Unavailable("storage lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}
