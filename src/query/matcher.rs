//! Criteria evaluator: conjunction of predicates against one record

use serde_json::Value;

use super::ast::SelectionCriterion;
use super::compare::compare;
use crate::errors::{DbError, DbResult};
use crate::schema::Record;

/// Evaluates a criteria conjunction against records of one table.
///
/// The key field is resolved from the record's primary key, not the record
/// body, so matching works even when the key is not stored in the body.
pub struct CriteriaMatcher<'a> {
    key_field: &'a str,
}

impl<'a> CriteriaMatcher<'a> {
    /// Creates a matcher for a table whose primary key is `key_field`
    pub fn new(key_field: &'a str) -> Self {
        Self { key_field }
    }

    /// Whether `record` (with primary key value `key`) satisfies every
    /// criterion. Short-circuits on the first failing criterion.
    ///
    /// Fails with `UnknownField` when a non-key criterion names a field the
    /// record does not carry.
    pub fn matches(
        &self,
        criteria: &[SelectionCriterion],
        key: &Value,
        record: &Record,
    ) -> DbResult<bool> {
        for criterion in criteria {
            let field_value = if criterion.field == self.key_field {
                key
            } else {
                record
                    .get(&criterion.field)
                    .ok_or_else(|| DbError::UnknownField(criterion.field.clone()))?
            };

            if !compare(criterion.operator, field_value, &criterion.value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator;
    use serde_json::json;

    fn ann() -> Record {
        json!({"id": 1, "name": "Ann", "age": 30})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let matcher = CriteriaMatcher::new("id");
        assert!(matcher.matches(&[], &json!(1), &ann()).unwrap());
    }

    #[test]
    fn test_conjunction_semantics() {
        let matcher = CriteriaMatcher::new("id");
        let record = ann();

        let both = [
            SelectionCriterion::eq("age", json!(30)),
            SelectionCriterion::eq("name", json!("Ann")),
        ];
        assert!(matcher.matches(&both, &json!(1), &record).unwrap());

        let one_fails = [
            SelectionCriterion::eq("age", json!(30)),
            SelectionCriterion::eq("name", json!("Bo")),
        ];
        assert!(!matcher.matches(&one_fails, &json!(1), &record).unwrap());
    }

    #[test]
    fn test_key_field_uses_key_value() {
        let matcher = CriteriaMatcher::new("id");
        // Body without the key field; the key value stands in for it.
        let record = json!({"name": "Ann"}).as_object().cloned().unwrap();

        let criteria = [SelectionCriterion::eq("id", json!(7))];
        assert!(matcher.matches(&criteria, &json!(7), &record).unwrap());
        assert!(!matcher.matches(&criteria, &json!(8), &record).unwrap());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let matcher = CriteriaMatcher::new("id");
        let criteria = [SelectionCriterion::eq("height", json!(180))];

        let err = matcher.matches(&criteria, &json!(1), &ann()).unwrap_err();
        assert!(matches!(err, DbError::UnknownField(ref f) if f == "height"));
    }

    #[test]
    fn test_short_circuit_before_type_error() {
        let matcher = CriteriaMatcher::new("id");
        // First criterion fails, so the ill-typed second is never evaluated.
        let criteria = [
            SelectionCriterion::eq("name", json!("Bo")),
            SelectionCriterion::new("age", Operator::Lt, json!("thirty")),
        ];
        assert!(!matcher.matches(&criteria, &json!(1), &ann()).unwrap());
    }
}
