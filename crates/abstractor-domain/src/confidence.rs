//! Confidence computation
//!
//! Implements the deterministic completeness formula: confidence is the
//! percentage of a schema's required fields that resolved to a usable value
//! in the merged record. Confidence is derived, never stored independently
//! of the record it describes.

use crate::schema::ExtractionSchema;
use serde_json::Value;

/// Resolve a dotted path against a record, field-by-field.
///
/// Returns `None` when any intermediate segment is missing or not an
/// object.
pub fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cursor = record;
    for segment in path.split('.') {
        cursor = cursor.as_object()?.get(segment)?;
    }
    Some(cursor)
}

/// Whether a resolved value counts as a completed field.
///
/// Null, absent, and empty-string values do not count; everything else
/// (including `false` and `0`) does.
fn is_completed(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Compute `round(100 × completed required fields / total required fields)`.
///
/// Returns 0 for schemas with no required fields. The result is always in
/// `[0, 100]` and is monotonically non-decreasing as more required fields
/// become non-null.
pub fn compute_confidence(record: &Value, schema: &ExtractionSchema) -> u8 {
    let total = schema.required_fields.len();
    if total == 0 {
        return 0;
    }

    let completed = schema
        .required_fields
        .iter()
        .filter(|field| is_completed(resolve_path(record, &field.path)))
        .count();

    ((100.0 * completed as f64 / total as f64).round() as u8).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, RequiredField};
    use serde_json::json;

    fn test_schema(paths: &[&str]) -> ExtractionSchema {
        ExtractionSchema {
            id: "test".to_string(),
            title: "Test".to_string(),
            prompt_preamble: String::new(),
            required_fields: paths
                .iter()
                .map(|p| RequiredField::new(*p, FieldKind::Text))
                .collect(),
        }
    }

    #[test]
    fn test_resolve_nested_path() {
        let record = json!({"parties": {"buyer": "Alice"}});
        assert_eq!(resolve_path(&record, "parties.buyer"), Some(&json!("Alice")));
        assert_eq!(resolve_path(&record, "parties.seller"), None);
        assert_eq!(resolve_path(&record, "missing.path"), None);
    }

    #[test]
    fn test_all_fields_complete() {
        let schema = test_schema(&["a", "b"]);
        let record = json!({"a": 1, "b": "x"});
        assert_eq!(compute_confidence(&record, &schema), 100);
    }

    #[test]
    fn test_half_complete() {
        let schema = test_schema(&["a", "b"]);
        let record = json!({"a": 1, "b": null});
        assert_eq!(compute_confidence(&record, &schema), 50);
    }

    #[test]
    fn test_empty_string_does_not_count() {
        let schema = test_schema(&["a"]);
        assert_eq!(compute_confidence(&json!({"a": ""}), &schema), 0);
        assert_eq!(compute_confidence(&json!({"a": "x"}), &schema), 100);
    }

    #[test]
    fn test_false_and_zero_count_as_completed() {
        let schema = test_schema(&["flag", "count"]);
        let record = json!({"flag": false, "count": 0});
        assert_eq!(compute_confidence(&record, &schema), 100);
    }

    #[test]
    fn test_rounding() {
        let schema = test_schema(&["a", "b", "c"]);
        let record = json!({"a": 1, "b": null, "c": null});
        // 100/3 = 33.33 -> 33
        assert_eq!(compute_confidence(&record, &schema), 33);
        let record = json!({"a": 1, "b": 2, "c": null});
        // 200/3 = 66.67 -> 67
        assert_eq!(compute_confidence(&record, &schema), 67);
    }

    #[test]
    fn test_monotonic_in_completed_fields() {
        let schema = test_schema(&["a", "b", "c", "d"]);
        let mut record = json!({"a": null, "b": null, "c": null, "d": null});
        let mut last = compute_confidence(&record, &schema);
        for path in ["a", "b", "c", "d"] {
            record[path] = json!("value");
            let next = compute_confidence(&record, &schema);
            assert!(next >= last);
            last = next;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_no_required_fields() {
        let schema = test_schema(&[]);
        assert_eq!(compute_confidence(&json!({"a": 1}), &schema), 0);
    }
}
