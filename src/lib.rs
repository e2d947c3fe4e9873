//! shelfdb - an embedded, single-process record store
//!
//! A catalog of named tables, each with a fixed field schema, a designated
//! primary key, optional secondary indexes, and criteria-based query/delete.

pub mod catalog;
pub mod errors;
pub mod index;
pub mod query;
pub mod schema;
pub mod store;
pub mod table;
