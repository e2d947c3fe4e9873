//! Persistent Map collaborator for shelfdb
//!
//! A durable string-key to JSON-value mapping. One store backs each table's
//! record set and each secondary index.
//!
//! # Design Principles
//!
//! - Scoped handles: a store is opened at the start of an operation and
//!   closed (flushed) on every exit path, including error paths
//! - Checksum-verified on every open; corruption is fatal
//! - Every mutation is durable before the call returns
//! - Reads copy values out; entries are never shared mutable state

mod env;
mod errors;
mod file;
mod mem;

pub use env::{KvStore, StoreEnv};
pub use errors::{StoreError, StoreResult};
pub use file::{FileEnv, FileStore};
pub use mem::{MemEnv, MemStore};
