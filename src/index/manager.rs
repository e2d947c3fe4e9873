//! Per-field index maintenance
//!
//! # API
//!
//! - `insert_entry(value, key)` - Add a key under a field value
//! - `remove_entry(value, key)` - Drop a key; deletes emptied entries
//! - `lookup(value)` - Candidate key list for equality queries
//! - `rebuild(records)` - Recompute the whole index from live records

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::{DbError, DbResult};
use crate::schema::{value_key, Record};
use crate::store::{KvStore, StoreEnv};

/// Maintains the secondary index for one field of one table.
///
/// Each operation opens the backing store for its own duration; the handle
/// is released on every exit path.
#[derive(Debug)]
pub struct FieldIndex<E: StoreEnv> {
    field: String,
    store_id: String,
    env: E,
}

impl<E: StoreEnv> FieldIndex<E> {
    /// Creates the manager for `field`, backed by the store named `store_id`
    pub fn new(field: impl Into<String>, store_id: impl Into<String>, env: E) -> Self {
        Self {
            field: field.into(),
            store_id: store_id.into(),
            env,
        }
    }

    /// The indexed field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The backing store identifier, as registered in the catalog entry
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Adds `key` to the entry for `value`, creating the entry if needed.
    ///
    /// Idempotent: a key already present under the value is not duplicated.
    pub fn insert_entry(&self, value: &Value, key: &str) -> DbResult<()> {
        let mut store = self.env.open(&self.store_id)?;
        let entry = value_key(value);

        let mut keys = match store.get(&entry)? {
            Some(existing) => self.parse_keys(&entry, existing)?,
            None => Vec::new(),
        };
        if keys.iter().any(|k| k == key) {
            return Ok(());
        }
        keys.push(key.to_string());

        store.set(&entry, Value::from(keys))?;
        Ok(())
    }

    /// Removes `key` from the entry for `value`.
    ///
    /// A missing entry or a missing key is an internal invariant violation:
    /// the mutation paths should have kept the index consistent with the
    /// record set. Emptied entries are deleted outright.
    pub fn remove_entry(&self, value: &Value, key: &str) -> DbResult<()> {
        let mut store = self.env.open(&self.store_id)?;
        let entry = value_key(value);

        let existing = store.get(&entry)?.ok_or_else(|| {
            tracing::warn!(field = %self.field, %entry, "index entry missing on removal");
            DbError::index_corruption(&self.field, format!("no entry for value {entry:?}"))
        })?;
        let mut keys = self.parse_keys(&entry, existing)?;

        let position = keys.iter().position(|k| k == key).ok_or_else(|| {
            tracing::warn!(field = %self.field, %entry, key, "key missing from index entry");
            DbError::index_corruption(
                &self.field,
                format!("key {key:?} not present under value {entry:?}"),
            )
        })?;

        if keys.len() > 1 {
            keys.remove(position);
            store.set(&entry, Value::from(keys))?;
        } else {
            store.delete(&entry)?;
        }
        Ok(())
    }

    /// Candidate primary keys for an equality predicate on `value`.
    /// Empty when no record holds the value.
    pub fn lookup(&self, value: &Value) -> DbResult<Vec<String>> {
        let store = self.env.open(&self.store_id)?;
        let entry = value_key(value);
        match store.get(&entry)? {
            Some(existing) => self.parse_keys(&entry, existing),
            None => Ok(Vec::new()),
        }
    }

    /// Rebuilds the index from scratch over the live record set.
    ///
    /// Records lacking the field are skipped. The grouping is computed in
    /// full before any write, so an inconsistency aborts the build without
    /// partially applying it.
    pub fn rebuild<'a, I>(&self, records: I) -> DbResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Record)>,
    {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, record) in records {
            let Some(value) = record.get(&self.field) else {
                continue;
            };
            let group = groups.entry(value_key(value)).or_default();
            if group.iter().any(|k| k == key) {
                return Err(DbError::index_corruption(
                    &self.field,
                    format!("key {key:?} seen twice while rebuilding"),
                ));
            }
            group.push(key.to_string());
        }

        let mut store = self.env.open(&self.store_id)?;
        for (entry, _) in store.scan_all()? {
            store.delete(&entry)?;
        }
        for (entry, keys) in groups {
            store.set(&entry, Value::from(keys))?;
        }
        Ok(())
    }

    fn parse_keys(&self, entry: &str, value: Value) -> DbResult<Vec<String>> {
        serde_json::from_value(value).map_err(|_| {
            DbError::index_corruption(
                &self.field,
                format!("entry for value {entry:?} is not a key list"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemEnv;
    use serde_json::json;

    fn index(env: &MemEnv) -> FieldIndex<MemEnv> {
        FieldIndex::new("age", "People.age.idx", env.clone())
    }

    fn record(json: Value) -> Record {
        json.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let env = MemEnv::new();
        let idx = index(&env);

        idx.insert_entry(&json!(30), "1").unwrap();
        idx.insert_entry(&json!(30), "2").unwrap();
        idx.insert_entry(&json!(31), "3").unwrap();

        assert_eq!(idx.lookup(&json!(30)).unwrap(), vec!["1", "2"]);
        assert_eq!(idx.lookup(&json!(31)).unwrap(), vec!["3"]);
        assert!(idx.lookup(&json!(99)).unwrap().is_empty());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let env = MemEnv::new();
        let idx = index(&env);

        idx.insert_entry(&json!(30), "1").unwrap();
        idx.insert_entry(&json!(30), "1").unwrap();

        assert_eq!(idx.lookup(&json!(30)).unwrap(), vec!["1"]);
    }

    #[test]
    fn test_remove_keeps_remaining_keys() {
        let env = MemEnv::new();
        let idx = index(&env);

        idx.insert_entry(&json!(30), "1").unwrap();
        idx.insert_entry(&json!(30), "2").unwrap();
        idx.remove_entry(&json!(30), "1").unwrap();

        assert_eq!(idx.lookup(&json!(30)).unwrap(), vec!["2"]);
    }

    #[test]
    fn test_remove_last_key_deletes_entry() {
        let env = MemEnv::new();
        let idx = index(&env);

        idx.insert_entry(&json!(30), "1").unwrap();
        idx.remove_entry(&json!(30), "1").unwrap();

        // No dangling empty list left behind
        let store = env.open("People.age.idx").unwrap();
        use crate::store::KvStore;
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_missing_entry_is_corruption() {
        let env = MemEnv::new();
        let idx = index(&env);

        let err = idx.remove_entry(&json!(30), "1").unwrap_err();
        assert!(matches!(err, DbError::IndexCorruption { .. }));
    }

    #[test]
    fn test_remove_missing_key_is_corruption() {
        let env = MemEnv::new();
        let idx = index(&env);

        idx.insert_entry(&json!(30), "1").unwrap();
        let err = idx.remove_entry(&json!(30), "2").unwrap_err();
        assert!(matches!(err, DbError::IndexCorruption { .. }));
    }

    #[test]
    fn test_rebuild_groups_by_value_and_skips_missing() {
        let env = MemEnv::new();
        let idx = index(&env);

        // Stale entry that the rebuild must clear out
        idx.insert_entry(&json!(99), "9").unwrap();

        let r1 = record(json!({"id": 1, "age": 30}));
        let r2 = record(json!({"id": 2, "age": 30}));
        let r3 = record(json!({"id": 3}));
        let records = [("1", &r1), ("2", &r2), ("3", &r3)];

        idx.rebuild(records).unwrap();

        assert_eq!(idx.lookup(&json!(30)).unwrap(), vec!["1", "2"]);
        assert!(idx.lookup(&json!(99)).unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_duplicate_key_aborts() {
        let env = MemEnv::new();
        let idx = index(&env);

        let r = record(json!({"id": 1, "age": 30}));
        let records = [("1", &r), ("1", &r)];

        let err = idx.rebuild(records).unwrap_err();
        assert!(matches!(err, DbError::IndexCorruption { .. }));
    }
}
