//! Keyed slot storage behind the result store.
//!
//! The store only needs three primitives on a named slot, which keeps the
//! durable medium swappable: SQLite in the app, [`MemoryStorage`] in tests and
//! as the session-only fallback when the database cannot be opened.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};

pub trait SlotStorage: Send + Sync {
    /// Returns `None` when the slot has never been written or was removed.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Cloning shares the same slots.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_slots() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        assert_eq!(storage.read("results").unwrap(), None);
        other.write("results", "[]").unwrap();
        assert_eq!(storage.read("results").unwrap().as_deref(), Some("[]"));

        storage.remove("results").unwrap();
        storage.remove("results").unwrap();
        assert_eq!(other.read("results").unwrap(), None);
    }
}
