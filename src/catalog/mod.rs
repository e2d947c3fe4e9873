//! Catalog for shelfdb
//!
//! The catalog owns the set of tables, persists one entry per table
//! (schema plus index registry) in a reserved store, and reconstructs
//! every table on open so work resumes exactly where a previous process
//! left off.

mod database;

pub use database::Database;
