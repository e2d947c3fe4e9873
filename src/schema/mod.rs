//! Schema definitions for shelfdb
//!
//! A table schema is an ordered set of typed fields plus the name of the
//! primary-key field. The schema, together with the registry of secondary
//! indexes, is the catalog entry persisted per table.

mod types;

pub use types::{
    index_store_id, records_store_id, value_key, value_type_name, Field, FieldType, Record,
    TableSchema, CATALOG_STORE_ID,
};
