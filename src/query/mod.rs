//! Criteria evaluation for shelfdb
//!
//! A query or delete is driven by a list of selection criteria combined as
//! a logical AND. Each criterion is one typed predicate dispatched to an
//! explicit comparison routine; caller data is never interpreted as
//! executable logic.

mod ast;
mod compare;
mod matcher;

pub use ast::{Operator, SelectionCriterion};
pub use compare::compare;
pub use matcher::CriteriaMatcher;
