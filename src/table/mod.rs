//! Table storage engine for shelfdb
//!
//! A table owns one persistent store for its records plus one index
//! manager per indexed field, and exposes CRUD and criteria-based
//! query/delete with access-path selection.
//!
//! # Invariants Enforced
//!
//! - No two live records share a primary key
//! - The primary key of a record never changes
//! - Secondary indexes stay consistent with the record set across every
//!   mutation

mod table;

pub use table::{AccessPath, Table};
