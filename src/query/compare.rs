//! Typed comparison dispatch
//!
//! Evaluates a single predicate against a field value. Numbers compare
//! numerically, strings lexicographically, booleans by equality only.
//! Incomparable pairs fail with `TypeMismatch`; no coercion across types.

use std::cmp::Ordering;

use serde_json::Value;

use super::ast::Operator;
use crate::errors::{DbError, DbResult};
use crate::schema::value_type_name;

/// Evaluates `field <operator> criterion`
pub fn compare(operator: Operator, field: &Value, criterion: &Value) -> DbResult<bool> {
    match (field, criterion) {
        (Value::Number(a), Value::Number(b)) => {
            let ord = compare_numbers(a, b).ok_or_else(|| {
                DbError::type_mismatch(
                    operator.as_str(),
                    value_type_name(field),
                    value_type_name(criterion),
                )
            })?;
            Ok(operator.holds(ord))
        }
        (Value::String(a), Value::String(b)) => Ok(operator.holds(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => match operator {
            Operator::Eq => Ok(a == b),
            Operator::Ne => Ok(a != b),
            _ => Err(DbError::type_mismatch(operator.as_str(), "bool", "bool")),
        },
        _ => Err(DbError::type_mismatch(
            operator.as_str(),
            value_type_name(field),
            value_type_name(criterion),
        )),
    }
}

/// Numeric ordering: exact for two integers, f64 otherwise.
/// JSON cannot carry NaN, so a float comparison only fails on the
/// u64/i64 edge where one side exceeds the f64-exact range.
fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_comparisons() {
        assert!(compare(Operator::Eq, &json!(30), &json!(30)).unwrap());
        assert!(!compare(Operator::Eq, &json!(30), &json!(31)).unwrap());
        assert!(compare(Operator::Ne, &json!(30), &json!(31)).unwrap());
        assert!(compare(Operator::Lt, &json!(29), &json!(30)).unwrap());
        assert!(compare(Operator::Le, &json!(30), &json!(30)).unwrap());
        assert!(compare(Operator::Gt, &json!(31), &json!(30)).unwrap());
        assert!(compare(Operator::Ge, &json!(30), &json!(30)).unwrap());
    }

    #[test]
    fn test_int_float_compare_numerically() {
        assert!(compare(Operator::Eq, &json!(30), &json!(30.0)).unwrap());
        assert!(compare(Operator::Lt, &json!(30), &json!(30.5)).unwrap());
    }

    #[test]
    fn test_string_comparisons_lexicographic() {
        assert!(compare(Operator::Eq, &json!("Ann"), &json!("Ann")).unwrap());
        assert!(compare(Operator::Lt, &json!("Ann"), &json!("Bo")).unwrap());
        assert!(compare(Operator::Ge, &json!("Bo"), &json!("Ann")).unwrap());
    }

    #[test]
    fn test_bool_equality_only() {
        assert!(compare(Operator::Eq, &json!(true), &json!(true)).unwrap());
        assert!(compare(Operator::Ne, &json!(true), &json!(false)).unwrap());

        let err = compare(Operator::Lt, &json!(true), &json!(false)).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { .. }));
    }

    #[test]
    fn test_cross_type_rejected() {
        // No coercion: "30" never matches 30
        let err = compare(Operator::Eq, &json!("30"), &json!(30)).unwrap_err();
        assert!(matches!(
            err,
            DbError::TypeMismatch {
                field_type: "string",
                criterion_type: "int",
                ..
            }
        ));

        assert!(compare(Operator::Eq, &json!(true), &json!(1)).is_err());
        assert!(compare(Operator::Eq, &json!(null), &json!(1)).is_err());
    }
}
