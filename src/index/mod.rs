//! Secondary indexes for shelfdb
//!
//! One index per indexed field, backed by its own persistent store mapping
//! the stringified field value to the ordered list of primary keys holding
//! that value.
//!
//! # Invariants Enforced
//!
//! - A key appears under a value iff the record with that key is live and
//!   its field holds that value
//! - A key appears at most once per distinct value
//! - No dangling empty lists

mod manager;

pub use manager::FieldIndex;
