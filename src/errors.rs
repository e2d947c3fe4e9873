//! # Engine Errors
//!
//! Unified error taxonomy for the record store. Every failure is reported to
//! the caller; no operation logs a validation error and proceeds regardless.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations
pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by catalog, table, index, and criteria operations
#[derive(Debug, Error)]
pub enum DbError {
    // ==================
    // Catalog Errors
    // ==================
    /// A table with this name is already registered
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    /// No table with this name is registered
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The declared key field does not name any schema field
    #[error("key field {0:?} does not match any declared field")]
    InvalidKeyField(String),

    // ==================
    // Record Errors
    // ==================
    /// Insertion payload lacks a schema field; the record is not stored
    #[error("record is missing required field {0:?}")]
    MissingField(String),

    /// A live record already holds this primary key
    #[error("duplicate primary key: {0}")]
    DuplicateKey(String),

    /// No live record holds this primary key
    #[error("record not found: {0}")]
    RecordNotFound(String),

    // ==================
    // Criteria Errors
    // ==================
    /// A criterion names a field the record does not carry
    #[error("unknown field in criteria: {0:?}")]
    UnknownField(String),

    /// Operator string outside the closed `=`, `!=`, `<`, `<=`, `>`, `>=` set
    #[error("unsupported operator: {0:?}")]
    UnsupportedOperator(String),

    /// Field value and criterion value are not comparable
    #[error("type mismatch: cannot apply {operator} to {field_type} and {criterion_type}")]
    TypeMismatch {
        /// Operator that was applied
        operator: &'static str,
        /// Semantic type of the record's field value
        field_type: &'static str,
        /// Semantic type of the criterion value
        criterion_type: &'static str,
    },

    // ==================
    // Index Errors
    // ==================
    /// Internal invariant violation; unreachable if mutation paths are correct
    #[error("index corruption on field {field:?}: {detail}")]
    IndexCorruption {
        /// Indexed field name
        field: String,
        /// What the invariant check found
        detail: String,
    },

    /// Failure in the persistent map collaborator
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DbError {
    /// Create a type-mismatch error from an operator and two value type names
    pub fn type_mismatch(
        operator: &'static str,
        field_type: &'static str,
        criterion_type: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            operator,
            field_type,
            criterion_type,
        }
    }

    /// Create an index-corruption error
    pub fn index_corruption(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::IndexCorruption {
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error is a fatal internal-invariant violation rather
    /// than a recoverable caller error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::IndexCorruption { .. } | Self::Store(StoreError::Corrupted { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors_are_not_fatal() {
        assert!(!DbError::TableNotFound("users".into()).is_fatal());
        assert!(!DbError::DuplicateKey("1".into()).is_fatal());
        assert!(!DbError::UnsupportedOperator("~=".into()).is_fatal());
    }

    #[test]
    fn test_invariant_violations_are_fatal() {
        assert!(DbError::index_corruption("age", "missing entry").is_fatal());
        assert!(DbError::Store(StoreError::corrupted("users.tbl", "checksum mismatch")).is_fatal());
    }

    #[test]
    fn test_display_names_the_field() {
        let err = DbError::MissingField("name".into());
        assert!(err.to_string().contains("\"name\""));
    }
}
