//! In-memory store environment
//!
//! Implements the same [`StoreEnv`]/[`KvStore`] contract as the file-backed
//! environment with no durability. Clones of a [`MemEnv`] share one
//! namespace, so "reopening" a store observes earlier mutations exactly as
//! the file-backed environment would. Used by the engine's tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::Value;

use super::env::{KvStore, StoreEnv};
use super::errors::StoreResult;

type Namespace = HashMap<String, BTreeMap<String, Value>>;

/// A shared in-memory namespace of stores
#[derive(Debug, Clone, Default)]
pub struct MemEnv {
    stores: Rc<RefCell<Namespace>>,
}

impl MemEnv {
    /// Creates an empty namespace
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreEnv for MemEnv {
    type Store = MemStore;

    fn open(&self, id: &str) -> StoreResult<MemStore> {
        self.stores
            .borrow_mut()
            .entry(id.to_string())
            .or_default();
        Ok(MemStore {
            id: id.to_string(),
            stores: Rc::clone(&self.stores),
        })
    }

    fn destroy(&self, id: &str) -> StoreResult<()> {
        self.stores.borrow_mut().remove(id);
        Ok(())
    }
}

/// One open handle on an in-memory store
pub struct MemStore {
    id: String,
    stores: Rc<RefCell<Namespace>>,
}

impl MemStore {
    // open() creates the entry; a handle that outlives destroy() sees an
    // empty store rather than a panic.
    fn with_entries<T>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> T) -> T {
        let stores = self.stores.borrow();
        match stores.get(&self.id) {
            Some(entries) => f(entries),
            None => f(&BTreeMap::new()),
        }
    }

    fn with_entries_mut<T>(&mut self, f: impl FnOnce(&mut BTreeMap<String, Value>) -> T) -> T {
        let mut stores = self.stores.borrow_mut();
        f(stores.entry(self.id.clone()).or_default())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.with_entries(|e| e.get(key).cloned()))
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        self.with_entries_mut(|e| {
            e.insert(key.to_string(), value);
        });
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.with_entries_mut(|e| {
            e.remove(key);
        });
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.with_entries(|e| e.contains_key(key))
    }

    fn scan_all(&self) -> StoreResult<Vec<(String, Value)>> {
        Ok(self.with_entries(|e| e.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
    }

    fn len(&self) -> usize {
        self.with_entries(|e| e.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_namespace() {
        let env = MemEnv::new();
        let mut store = env.open("users").unwrap();
        store.set("1", json!("Ann")).unwrap();

        let other = env.clone().open("users").unwrap();
        assert_eq!(other.get("1").unwrap(), Some(json!("Ann")));
    }

    #[test]
    fn test_destroy_drops_entries() {
        let env = MemEnv::new();
        let mut store = env.open("users").unwrap();
        store.set("1", json!("Ann")).unwrap();

        env.destroy("users").unwrap();

        let store = env.open("users").unwrap();
        assert!(store.is_empty());
    }
}
