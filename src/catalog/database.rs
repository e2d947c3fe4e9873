//! Table lifecycle and catalog persistence

use std::collections::BTreeMap;

use crate::errors::{DbError, DbResult};
use crate::schema::{Field, TableSchema, CATALOG_STORE_ID};
use crate::store::{KvStore, StoreError, StoreEnv};
use crate::table::Table;

/// The catalog: exclusively owns every live table, keyed by name.
///
/// State is instance-owned; two `Database` values over separate
/// environments share nothing. Opening a `Database` over an environment
/// with persisted entries reconstructs every table.
pub struct Database<E: StoreEnv> {
    env: E,
    tables: BTreeMap<String, Table<E>>,
}

impl<E: StoreEnv> Database<E> {
    /// Opens the catalog, reloading every persisted entry into a live
    /// table with its index registry.
    pub fn open(env: E) -> DbResult<Self> {
        let catalog = env.open(CATALOG_STORE_ID)?;
        let mut tables = BTreeMap::new();

        for (name, entry) in catalog.scan_all()? {
            let schema: TableSchema = serde_json::from_value(entry).map_err(|e| {
                StoreError::corrupted(
                    CATALOG_STORE_ID,
                    format!("unparseable entry for table {name:?}: {e}"),
                )
            })?;
            tables.insert(
                name.clone(),
                Table::from_catalog_entry(name, schema, env.clone()),
            );
        }

        tracing::debug!(tables = tables.len(), "catalog opened");
        Ok(Self { env, tables })
    }

    /// Creates a table and persists its catalog entry.
    ///
    /// Fails with `TableAlreadyExists` if the name is taken and with
    /// `InvalidKeyField` if `key_field` does not name a declared field.
    pub fn create_table(
        &mut self,
        name: &str,
        fields: Vec<Field>,
        key_field: &str,
    ) -> DbResult<&mut Table<E>> {
        if self.tables.contains_key(name) {
            return Err(DbError::TableAlreadyExists(name.to_string()));
        }

        let schema = TableSchema::new(fields, key_field);
        if !schema.key_field_is_declared() {
            return Err(DbError::InvalidKeyField(key_field.to_string()));
        }

        let table = Table::from_catalog_entry(name, schema.clone(), self.env.clone());

        // Create the record store eagerly so the table exists on disk
        // before its entry does.
        self.env.open(table.records_store_id())?;

        let entry = serde_json::to_value(&schema).map_err(|e| {
            StoreError::corrupted(CATALOG_STORE_ID, format!("unserializable catalog entry: {e}"))
        })?;
        let mut catalog = self.env.open(CATALOG_STORE_ID)?;
        catalog.set(name, entry)?;
        drop(catalog);

        tracing::debug!(table = name, "table created");
        self.tables.insert(name.to_string(), table);
        self.get_table_mut(name)
    }

    /// Borrows a table for reads
    pub fn get_table(&self, name: &str) -> DbResult<&Table<E>> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Borrows a table for mutation
    pub fn get_table_mut(&mut self, name: &str) -> DbResult<&mut Table<E>> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Deletes a table: destroys the record store and every index store,
    /// then removes the catalog entry.
    pub fn delete_table(&mut self, name: &str) -> DbResult<()> {
        let table = self
            .tables
            .remove(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        table.destroy_stores()?;

        let mut catalog = self.env.open(CATALOG_STORE_ID)?;
        catalog.delete(name)?;

        tracing::debug!(table = name, "table deleted");
        Ok(())
    }

    /// Number of live tables
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Names of every live table
    pub fn get_tables_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}
