//! Criteria types: operators and selection criteria

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DbError, DbResult};

/// Closed set of relational operators.
///
/// `=` denotes equality, not assignment. Anything outside this set is
/// rejected at parse time with `UnsupportedOperator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Operator {
    /// Parses an operator from its textual form
    pub fn parse(s: &str) -> DbResult<Self> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(DbError::UnsupportedOperator(other.to_string())),
        }
    }

    /// The textual form of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Whether an observed ordering between field and criterion value
    /// satisfies this operator
    pub fn holds(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Operator::Eq => ord == Equal,
            Operator::Ne => ord != Equal,
            Operator::Lt => ord == Less,
            Operator::Le => ord != Greater,
            Operator::Gt => ord == Greater,
            Operator::Ge => ord != Less,
        }
    }

    /// Whether this is the equality operator (the only one an index serves)
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq)
    }
}

/// One typed predicate against a named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriterion {
    /// Field the predicate applies to
    pub field: String,
    /// Relational operator
    pub operator: Operator,
    /// Criterion value the field is compared against
    pub value: Value,
}

impl SelectionCriterion {
    /// Create a criterion
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Equality criterion
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Inequality criterion
    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Ne, value)
    }

    /// Less-than criterion
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Lt, value)
    }

    /// Less-or-equal criterion
    pub fn le(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Le, value)
    }

    /// Greater-than criterion
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Gt, value)
    }

    /// Greater-or-equal criterion
    pub fn ge(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Ge, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_operators() {
        for (text, op) in [
            ("=", Operator::Eq),
            ("!=", Operator::Ne),
            ("<", Operator::Lt),
            ("<=", Operator::Le),
            (">", Operator::Gt),
            (">=", Operator::Ge),
        ] {
            assert_eq!(Operator::parse(text).unwrap(), op);
            assert_eq!(op.as_str(), text);
        }
    }

    #[test]
    fn test_parse_unknown_operator_rejected() {
        for text in ["==", "~=", "in", ""] {
            let err = Operator::parse(text).unwrap_err();
            assert!(matches!(err, DbError::UnsupportedOperator(ref s) if s == text));
        }
    }

    #[test]
    fn test_holds() {
        use std::cmp::Ordering::*;
        assert!(Operator::Eq.holds(Equal));
        assert!(!Operator::Eq.holds(Less));
        assert!(Operator::Ne.holds(Greater));
        assert!(Operator::Le.holds(Equal));
        assert!(Operator::Le.holds(Less));
        assert!(!Operator::Le.holds(Greater));
        assert!(Operator::Ge.holds(Greater));
        assert!(!Operator::Lt.holds(Equal));
    }
}
