//! Store traits: the seam between the engine and its persistence collaborator
//!
//! The engine only ever talks to a [`StoreEnv`] (which opens and destroys
//! named stores) and to [`KvStore`] handles (which read and mutate one
//! store). Production code uses the file-backed implementation; tests run
//! the same engine against the in-memory one.

use serde_json::Value;

use super::errors::StoreResult;

/// One open, scoped handle on a durable string-key to JSON-value mapping.
///
/// Handles follow RAII: dropping the handle releases the store, and every
/// mutation is durable before the method returns.
pub trait KvStore {
    /// Returns a copy of the value stored under `key`, if any
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Stores `value` under `key`, overwriting any previous value
    fn set(&mut self, key: &str, value: Value) -> StoreResult<()>;

    /// Removes the entry for `key`; absent keys are a no-op
    fn delete(&mut self, key: &str) -> StoreResult<()>;

    /// Whether an entry exists for `key`
    fn contains(&self, key: &str) -> bool;

    /// Returns a copy of every entry. Finite, restartable per open.
    fn scan_all(&self) -> StoreResult<Vec<(String, Value)>>;

    /// Number of live entries
    fn len(&self) -> usize;

    /// Whether the store holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An environment that owns a namespace of stores, keyed by identifier.
///
/// `Clone` is cheap and clones share the same underlying namespace, so a
/// catalog and the tables it owns can each hold their own handle factory.
pub trait StoreEnv: Clone {
    /// Handle type produced by [`StoreEnv::open`]
    type Store: KvStore;

    /// Opens the store named `id`, creating it empty if it does not exist
    fn open(&self, id: &str) -> StoreResult<Self::Store>;

    /// Destroys the store named `id` and its backing state.
    /// Destroying an absent store is a no-op.
    fn destroy(&self, id: &str) -> StoreResult<()>;
}
