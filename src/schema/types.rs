//! Schema type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier of the reserved store holding one catalog entry per table
pub const CATALOG_STORE_ID: &str = "__catalog__";

/// A record body: field name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// Semantic type tag for a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }

    /// The semantic type of a scalar JSON value, if it has one
    pub fn of_value(value: &Value) -> Option<FieldType> {
        match value {
            Value::String(_) => Some(FieldType::String),
            Value::Number(n) if n.is_f64() => Some(FieldType::Float),
            Value::Number(_) => Some(FieldType::Int),
            Value::Bool(_) => Some(FieldType::Bool),
            _ => None,
        }
    }
}

/// The semantic type name of any JSON value, for error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match FieldType::of_value(value) {
        Some(t) => t.type_name(),
        None => match value {
            Value::Null => "null",
            Value::Array(_) => "array",
            _ => "object",
        },
    }
}

/// Canonical string form of a field value, used as a store key.
///
/// Strings are used verbatim; every other scalar uses its JSON text,
/// except that an integral float renders as the equal integer. Numbers
/// that compare equal must share one key, or the key-lookup and indexed
/// paths would address different entries than a scan matches (and a
/// float key could slip past the duplicate check on an int key).
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f)
                if n.as_i64().is_none()
                    && n.as_u64().is_none()
                    && f.fract() == 0.0
                    && f >= i64::MIN as f64
                    && f < i64::MAX as f64 =>
            {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// One column of a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    /// Create a field definition
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Create a string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Create an int field
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Create a float field
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Create a bool field
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }
}

/// Complete per-table catalog entry: ordered fields, key field, and the
/// registry of secondary indexes (field name to index store id).
///
/// Fields and key field are immutable after table creation; only the index
/// registry changes, through `create_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Ordered field definitions
    pub fields: Vec<Field>,
    /// Name of the primary-key field; must name exactly one field
    pub key_field: String,
    /// Registry of secondary indexes
    #[serde(default)]
    pub indexes: BTreeMap<String, String>,
}

impl TableSchema {
    /// Create a schema with no indexes
    pub fn new(fields: Vec<Field>, key_field: impl Into<String>) -> Self {
        Self {
            fields,
            key_field: key_field.into(),
            indexes: BTreeMap::new(),
        }
    }

    /// Whether the key field names a declared field
    pub fn key_field_is_declared(&self) -> bool {
        self.fields.iter().any(|f| f.name == self.key_field)
    }

    /// Iterates the declared field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Store id backing a table's record set
pub fn records_store_id(table: &str) -> String {
    format!("{table}.tbl")
}

/// Store id backing a secondary index
pub fn index_store_id(table: &str, field: &str) -> String {
    format!("{table}.{field}.idx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people_schema() -> TableSchema {
        TableSchema::new(
            vec![Field::int("id"), Field::string("name"), Field::int("age")],
            "id",
        )
    }

    #[test]
    fn test_key_field_declared() {
        assert!(people_schema().key_field_is_declared());

        let schema = TableSchema::new(vec![Field::string("name")], "id");
        assert!(!schema.key_field_is_declared());
    }

    #[test]
    fn test_catalog_entry_roundtrip() {
        let mut schema = people_schema();
        schema
            .indexes
            .insert("age".into(), index_store_id("People", "age"));

        let value = serde_json::to_value(&schema).unwrap();
        let back: TableSchema = serde_json::from_value(value).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.indexes.get("age").unwrap(), "People.age.idx");
    }

    #[test]
    fn test_value_key_strings_verbatim() {
        assert_eq!(value_key(&json!("Ann")), "Ann");
        assert_eq!(value_key(&json!(30)), "30");
        assert_eq!(value_key(&json!(30.5)), "30.5");
        assert_eq!(value_key(&json!(true)), "true");
    }

    #[test]
    fn test_value_key_equal_numbers_share_one_key() {
        assert_eq!(value_key(&json!(30.0)), value_key(&json!(30)));
        assert_eq!(value_key(&json!(-4.0)), value_key(&json!(-4)));
        assert_eq!(value_key(&json!(0.0)), "0");
        // Non-integral floats keep their own keys
        assert_ne!(value_key(&json!(30.5)), value_key(&json!(30)));
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(value_type_name(&json!("x")), "string");
        assert_eq!(value_type_name(&json!(1)), "int");
        assert_eq!(value_type_name(&json!(1.5)), "float");
        assert_eq!(value_type_name(&json!(false)), "bool");
        assert_eq!(value_type_name(&json!(null)), "null");
        assert_eq!(value_type_name(&json!([1])), "array");
    }
}
