//! Table CRUD and access-path query/delete
//!
//! Access path priority (strict order):
//! 1. Primary-key equality lookup
//! 2. Indexed equality lookup, full criteria re-checked per candidate
//! 3. Full scan
//!
//! Within a priority level, the first eligible criterion in list order
//! wins; selectivity across multiple eligible indexes is not compared.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::{DbError, DbResult};
use crate::index::FieldIndex;
use crate::query::{CriteriaMatcher, SelectionCriterion};
use crate::schema::{index_store_id, records_store_id, value_key, Record, TableSchema, CATALOG_STORE_ID};
use crate::store::{KvStore, StoreError, StoreEnv};

/// Strategy chosen to satisfy a criteria-based query or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    /// Single fetch by primary key; `position` is the criterion that
    /// supplied the key
    KeyLookup {
        /// Index of the deciding criterion in the criteria list
        position: usize,
    },
    /// Candidate list from a secondary index; `position` is the deciding
    /// equality criterion
    IndexLookup {
        /// Index of the deciding criterion in the criteria list
        position: usize,
    },
    /// Test every record in the table
    FullScan,
}

impl AccessPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPath::KeyLookup { .. } => "KEY_LOOKUP",
            AccessPath::IndexLookup { .. } => "INDEX_EQ",
            AccessPath::FullScan => "FULL_SCAN",
        }
    }
}

/// One named table: schema, record store, and secondary indexes.
///
/// Every operation opens the stores it touches for its own duration;
/// handles are released on all exit paths. Mutating operations take
/// `&mut self`, so exclusive access is enforced by the borrow checker
/// for the duration of the call.
#[derive(Debug)]
pub struct Table<E: StoreEnv> {
    name: String,
    schema: TableSchema,
    records_store_id: String,
    env: E,
    indexes: BTreeMap<String, FieldIndex<E>>,
}

impl<E: StoreEnv> Table<E> {
    /// Reconstructs a table from its catalog entry, rebuilding the index
    /// manager set from the schema's index registry.
    pub fn from_catalog_entry(name: impl Into<String>, schema: TableSchema, env: E) -> Self {
        let name = name.into();
        let indexes = schema
            .indexes
            .iter()
            .map(|(field, store_id)| {
                (
                    field.clone(),
                    FieldIndex::new(field.clone(), store_id.clone(), env.clone()),
                )
            })
            .collect();

        Self {
            records_store_id: records_store_id(&name),
            name,
            schema,
            env,
            indexes,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's schema and index registry
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Identifier of the store backing the record set
    pub fn records_store_id(&self) -> &str {
        &self.records_store_id
    }

    /// Number of live records
    pub fn count(&self) -> DbResult<usize> {
        let store = self.env.open(&self.records_store_id)?;
        Ok(store.len())
    }

    /// Inserts a record.
    ///
    /// `values` must carry every schema field; a missing field aborts the
    /// insertion with `MissingField` and stores nothing. A live record
    /// under the same primary key fails with `DuplicateKey`. On success,
    /// every indexed field present in `values` gains an index entry.
    pub fn insert_record(&mut self, values: Record) -> DbResult<()> {
        for field in self.schema.field_names() {
            if !values.contains_key(field) {
                return Err(DbError::MissingField(field.to_string()));
            }
        }

        // The key field is a schema field, so it is present after the
        // check above.
        let key_value = values
            .get(&self.schema.key_field)
            .cloned()
            .ok_or_else(|| DbError::MissingField(self.schema.key_field.clone()))?;
        let key = value_key(&key_value);

        let mut store = self.env.open(&self.records_store_id)?;
        if store.contains(&key) {
            return Err(DbError::DuplicateKey(key));
        }
        store.set(&key, Value::Object(values.clone()))?;
        drop(store);

        for (field, index) in &self.indexes {
            if let Some(value) = values.get(field) {
                index.insert_entry(value, &key)?;
            }
        }

        tracing::debug!(table = %self.name, %key, "record inserted");
        Ok(())
    }

    /// Returns a copy of the record stored under `key`
    pub fn get_record(&self, key: &Value) -> DbResult<Record> {
        let key = value_key(key);
        let store = self.env.open(&self.records_store_id)?;
        let value = store
            .get(&key)?
            .ok_or_else(|| DbError::RecordNotFound(key.clone()))?;
        self.parse_record(&key, value)
    }

    /// Deletes the record stored under `key`, dropping its index entries
    /// first.
    pub fn delete_record(&mut self, key: &Value) -> DbResult<()> {
        let key = value_key(key);
        let mut store = self.env.open(&self.records_store_id)?;
        let value = store
            .get(&key)?
            .ok_or_else(|| DbError::RecordNotFound(key.clone()))?;
        let record = self.parse_record(&key, value)?;

        self.remove_index_entries(&key, &record)?;
        store.delete(&key)?;

        tracing::debug!(table = %self.name, %key, "record deleted");
        Ok(())
    }

    /// Partial update: fields present in `values` overwrite the stored
    /// record, unspecified fields are preserved.
    ///
    /// The key field is never altered; a different value supplied under
    /// the key field name is ignored. Reindexing is governed solely by
    /// key presence in `values`: `0` and `""` are real values, not
    /// absences.
    pub fn update_record(&mut self, key: &Value, values: &Record) -> DbResult<()> {
        let key = value_key(key);
        let mut store = self.env.open(&self.records_store_id)?;
        let old = store
            .get(&key)?
            .ok_or_else(|| DbError::RecordNotFound(key.clone()))?;
        let old = self.parse_record(&key, old)?;

        let mut updated = old.clone();
        for (field, value) in values {
            if *field == self.schema.key_field {
                continue;
            }
            updated.insert(field.clone(), value.clone());
        }

        // The record write goes first: if it fails, the indexes still
        // describe the stored state.
        store.set(&key, Value::Object(updated))?;
        drop(store);

        for (field, index) in &self.indexes {
            if *field == self.schema.key_field {
                continue;
            }
            let Some(new_value) = values.get(field) else {
                continue;
            };
            match old.get(field) {
                Some(old_value) if value_key(old_value) == value_key(new_value) => {}
                Some(old_value) => {
                    index.remove_entry(old_value, &key)?;
                    index.insert_entry(new_value, &key)?;
                }
                None => index.insert_entry(new_value, &key)?,
            }
        }

        tracing::debug!(table = %self.name, %key, "record updated");
        Ok(())
    }

    /// Builds (or rebuilds from scratch) the secondary index on `field`
    /// from the current record set, registers it in the schema's index
    /// registry, and persists the catalog entry update.
    ///
    /// Usable at any time, empty table or not.
    pub fn create_index(&mut self, field: &str) -> DbResult<()> {
        let records = self.all_records()?;

        let store_id = self
            .schema
            .indexes
            .get(field)
            .cloned()
            .unwrap_or_else(|| index_store_id(&self.name, field));
        let index = FieldIndex::new(field, store_id.clone(), self.env.clone());
        index.rebuild(records.iter().map(|(k, r)| (k.as_str(), r)))?;

        self.schema.indexes.insert(field.to_string(), store_id);
        self.indexes.insert(field.to_string(), index);
        self.persist_catalog_entry()?;

        tracing::debug!(table = %self.name, field, "index created");
        Ok(())
    }

    /// The access path that would serve this criteria list
    pub fn access_path(&self, criteria: &[SelectionCriterion]) -> AccessPath {
        if let Some(position) = criteria
            .iter()
            .position(|c| c.operator.is_equality() && c.field == self.schema.key_field)
        {
            return AccessPath::KeyLookup { position };
        }
        if let Some(position) = criteria
            .iter()
            .position(|c| c.operator.is_equality() && self.indexes.contains_key(&c.field))
        {
            return AccessPath::IndexLookup { position };
        }
        AccessPath::FullScan
    }

    /// Returns every record satisfying the criteria conjunction.
    ///
    /// The chosen access path only narrows the candidate set; the full
    /// criteria list is re-checked against each candidate, so for schema
    /// fields results do not depend on the path taken. A criterion over
    /// an extra (non-schema) field is stricter on the scan path: any
    /// record lacking the field fails the query with `UnknownField`,
    /// while the indexed path only ever examines records that carry it.
    pub fn query_table(&self, criteria: &[SelectionCriterion]) -> DbResult<Vec<Record>> {
        Ok(self
            .collect_matches(criteria)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// Deletes every record satisfying the criteria conjunction, removing
    /// each record's index entries before the record itself. Returns the
    /// number of records deleted.
    pub fn delete_records(&mut self, criteria: &[SelectionCriterion]) -> DbResult<usize> {
        let matches = self.collect_matches(criteria)?;

        let mut store = self.env.open(&self.records_store_id)?;
        for (key, record) in &matches {
            self.remove_index_entries(key, record)?;
            store.delete(key)?;
        }

        tracing::debug!(table = %self.name, deleted = matches.len(), "records deleted by criteria");
        Ok(matches.len())
    }

    /// Destroys every store backing this table: records and all indexes.
    /// Called by the catalog when the table is deleted.
    pub(crate) fn destroy_stores(&self) -> DbResult<()> {
        for index in self.indexes.values() {
            self.env.destroy(index.store_id())?;
        }
        self.env.destroy(&self.records_store_id)?;
        Ok(())
    }

    fn collect_matches(&self, criteria: &[SelectionCriterion]) -> DbResult<Vec<(String, Record)>> {
        let matcher = CriteriaMatcher::new(&self.schema.key_field);
        let store = self.env.open(&self.records_store_id)?;
        let mut matches = Vec::new();

        let path = self.access_path(criteria);
        tracing::debug!(table = %self.name, path = path.as_str(), "evaluating criteria");
        match path {
            AccessPath::KeyLookup { position } => {
                let key = value_key(&criteria[position].value);
                if let Some(value) = store.get(&key)? {
                    let record = self.parse_record(&key, value)?;
                    let key_value = self.key_value(&key, &record);
                    if matcher.matches(criteria, &key_value, &record)? {
                        matches.push((key, record));
                    }
                }
            }
            AccessPath::IndexLookup { position } => {
                let criterion = &criteria[position];
                let index = self.indexes.get(&criterion.field).ok_or_else(|| {
                    DbError::index_corruption(&criterion.field, "index vanished during query")
                })?;
                for key in index.lookup(&criterion.value)? {
                    let value = store.get(&key)?.ok_or_else(|| {
                        DbError::index_corruption(
                            &criterion.field,
                            format!("entry references missing record {key:?}"),
                        )
                    })?;
                    let record = self.parse_record(&key, value)?;
                    let key_value = self.key_value(&key, &record);
                    if matcher.matches(criteria, &key_value, &record)? {
                        matches.push((key, record));
                    }
                }
            }
            AccessPath::FullScan => {
                for (key, value) in store.scan_all()? {
                    let record = self.parse_record(&key, value)?;
                    let key_value = self.key_value(&key, &record);
                    if matcher.matches(criteria, &key_value, &record)? {
                        matches.push((key, record));
                    }
                }
            }
        }

        Ok(matches)
    }

    fn remove_index_entries(&self, key: &str, record: &Record) -> DbResult<()> {
        for (field, index) in &self.indexes {
            if let Some(value) = record.get(field) {
                index.remove_entry(value, key)?;
            }
        }
        Ok(())
    }

    fn all_records(&self) -> DbResult<Vec<(String, Record)>> {
        let store = self.env.open(&self.records_store_id)?;
        store
            .scan_all()?
            .into_iter()
            .map(|(key, value)| {
                let record = self.parse_record(&key, value)?;
                Ok((key, record))
            })
            .collect()
    }

    fn persist_catalog_entry(&self) -> DbResult<()> {
        let entry = serde_json::to_value(&self.schema).map_err(|e| {
            StoreError::corrupted(CATALOG_STORE_ID, format!("unserializable catalog entry: {e}"))
        })?;
        let mut catalog = self.env.open(CATALOG_STORE_ID)?;
        catalog.set(&self.name, entry)?;
        Ok(())
    }

    fn parse_record(&self, key: &str, value: Value) -> DbResult<Record> {
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(DbError::Store(StoreError::corrupted(
                &self.records_store_id,
                format!("record {key:?} is not an object"),
            ))),
        }
    }

    /// The typed primary-key value for a stored record. The key field is
    /// normally in the body; the stringified store key stands in when a
    /// body was stored without it.
    fn key_value(&self, key: &str, record: &Record) -> Value {
        record
            .get(&self.schema.key_field)
            .cloned()
            .unwrap_or_else(|| Value::String(key.to_string()))
    }
}
