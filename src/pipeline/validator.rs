use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::data_model::{RawRecord, RejectionReason, ValidationDiagnostic};

/// First-occurrence index of each `recipe_id` string in the batch, built by
/// the orchestrator in a single-threaded pre-pass and handed to the
/// validator as a read-only reference. This is the only cross-record state
/// in the pipeline; building it up front means the per-record stage needs no
/// locking.
pub type IdIndex = HashMap<String, usize>;

/// Builds the first-occurrence index for duplicate detection. Records whose
/// `recipe_id` is missing or not a string are skipped; they fail earlier
/// checks anyway.
///
/// Ownership of an id goes by position, not by validity: an id first seen on
/// a record that is itself rejected for another reason still marks every
/// later record carrying that id as a duplicate. Uniqueness is a property of
/// the input batch, not of the accepted subset.
pub fn build_id_index(records: &[RawRecord]) -> IdIndex {
    let mut index = IdIndex::new();
    for (i, raw) in records.iter().enumerate() {
        if let Some(Value::String(id)) = raw.get("recipe_id") {
            index.entry(id.clone()).or_insert(i);
        }
    }
    index
}

/// Validates a single raw record against the schema contract.
///
/// Fail-fast: the diagnostic for the FIRST failing check is returned and
/// later checks are not evaluated, so one record reports exactly one reason.
/// Check ordering is fixed (title, ingredients, directions, recipe_id,
/// duplicate) to keep the reported reason deterministic across runs.
pub fn validate(
    raw: &RawRecord,
    record_ref: &str,
    position: usize,
    id_index: &IdIndex,
) -> Result<(), ValidationDiagnostic> {
    check_non_empty_string(raw, "title", record_ref)?;
    check_non_empty_string_array(raw, "ingredients", record_ref)?;
    check_non_empty_string_array(raw, "directions", record_ref)?;

    let id = check_non_empty_string(raw, "recipe_id", record_ref)?;
    if Uuid::parse_str(id).is_err() {
        return Err(ValidationDiagnostic::new(
            record_ref,
            RejectionReason::TypeMismatch,
            format!("Field 'recipe_id' is not a valid UUID: '{}'", id),
        ));
    }

    // The first occurrence of an id is the legitimate owner; every later
    // record carrying the same id is the duplicate.
    if let Some(&first) = id_index.get(id) {
        if first != position {
            return Err(ValidationDiagnostic::new(
                record_ref,
                RejectionReason::DuplicateId,
                format!(
                    "Field 'recipe_id' '{}' duplicates record #{} of this batch",
                    id,
                    first + 1
                ),
            ));
        }
    }

    Ok(())
}

fn check_non_empty_string<'a>(
    raw: &'a RawRecord,
    field: &str,
    record_ref: &str,
) -> Result<&'a str, ValidationDiagnostic> {
    match raw.get(field) {
        None => Err(ValidationDiagnostic::new(
            record_ref,
            RejectionReason::MissingField,
            format!("Required field '{}' is missing", field),
        )),
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                Err(ValidationDiagnostic::new(
                    record_ref,
                    RejectionReason::EmptyRequiredField,
                    format!("Required field '{}' is empty", field),
                ))
            } else {
                Ok(s)
            }
        }
        Some(other) => Err(ValidationDiagnostic::new(
            record_ref,
            RejectionReason::TypeMismatch,
            format!(
                "Field '{}' must be a string, got {}",
                field,
                json_type_name(other)
            ),
        )),
    }
}

fn check_non_empty_string_array(
    raw: &RawRecord,
    field: &str,
    record_ref: &str,
) -> Result<(), ValidationDiagnostic> {
    match raw.get(field) {
        None => Err(ValidationDiagnostic::new(
            record_ref,
            RejectionReason::MissingField,
            format!("Required field '{}' is missing", field),
        )),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(ValidationDiagnostic::new(
                    record_ref,
                    RejectionReason::EmptyRequiredField,
                    format!("Required field '{}' is an empty list", field),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(ValidationDiagnostic::new(
                        record_ref,
                        RejectionReason::TypeMismatch,
                        format!(
                            "Field '{}' element {} must be a string, got {}",
                            field,
                            i,
                            json_type_name(item)
                        ),
                    ));
                }
            }
            Ok(())
        }
        Some(other) => Err(ValidationDiagnostic::new(
            record_ref,
            RejectionReason::TypeMismatch,
            format!(
                "Field '{}' must be a list of strings, got {}",
                field,
                json_type_name(other)
            ),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID_A: &str = "7c9e82bd-9ed4-44d0-a9a0-8215b23eb3ad";
    const ID_B: &str = "3f2b8a10-54c1-4e8f-9d2e-6b7a8c9d0e1f";

    fn raw(value: serde_json::Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("Test record must be a JSON object, got {:?}", other),
        }
    }

    fn valid_record(id: &str) -> RawRecord {
        raw(json!({
            "title": "Pancakes",
            "ingredients": ["flour", "milk", "eggs"],
            "directions": ["Mix everything.", "Fry for 3 minutes."],
            "tags": ["breakfast"],
            "recipe_id": id,
        }))
    }

    fn reason_of(result: Result<(), ValidationDiagnostic>) -> RejectionReason {
        result.expect_err("Expected a diagnostic").reason
    }

    #[test]
    fn test_valid_record_passes() {
        let record = valid_record(ID_A);
        let index = build_id_index(std::slice::from_ref(&record));
        assert!(validate(&record, "b#1", 0, &index).is_ok());
    }

    #[test]
    fn test_missing_title() {
        let mut record = valid_record(ID_A);
        record.remove("title");
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        let diag = result.expect_err("Missing title must be rejected");
        assert_eq!(diag.reason, RejectionReason::MissingField);
        assert!(diag.detail.contains("'title'"));
    }

    #[test]
    fn test_empty_title() {
        let mut record = valid_record(ID_A);
        record.insert("title".into(), json!("   "));
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        assert_eq!(reason_of(result), RejectionReason::EmptyRequiredField);
    }

    #[test]
    fn test_ingredients_wrong_type() {
        let mut record = valid_record(ID_A);
        record.insert("ingredients".into(), json!("flour, milk"));
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        assert_eq!(reason_of(result), RejectionReason::TypeMismatch);
    }

    #[test]
    fn test_ingredients_non_string_element() {
        let mut record = valid_record(ID_A);
        record.insert("ingredients".into(), json!(["flour", 42]));
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        let diag = result.expect_err("Non-string element must be rejected");
        assert_eq!(diag.reason, RejectionReason::TypeMismatch);
        assert!(diag.detail.contains("element 1"));
    }

    #[test]
    fn test_empty_directions_list() {
        let mut record = valid_record(ID_A);
        record.insert("directions".into(), json!([]));
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        assert_eq!(reason_of(result), RejectionReason::EmptyRequiredField);
    }

    #[test]
    fn test_malformed_recipe_id() {
        let mut record = valid_record(ID_A);
        record.insert("recipe_id".into(), json!("not-a-uuid"));
        let result = validate(&record, "b#1", 0, &IdIndex::new());
        let diag = result.expect_err("Malformed UUID must be rejected");
        assert_eq!(diag.reason, RejectionReason::TypeMismatch);
        assert!(diag.detail.contains("not a valid UUID"));
    }

    #[test]
    fn test_duplicate_id_flags_later_record_only() {
        let records = vec![valid_record(ID_A), valid_record(ID_B), valid_record(ID_A)];
        let index = build_id_index(&records);

        assert!(validate(&records[0], "b#1", 0, &index).is_ok());
        assert!(validate(&records[1], "b#2", 1, &index).is_ok());
        let diag = validate(&records[2], "b#3", 2, &index).expect_err("Third record duplicates #1");
        assert_eq!(diag.reason, RejectionReason::DuplicateId);
        assert!(diag.detail.contains("duplicates record #1"));
    }

    #[test]
    fn test_rejected_first_record_still_owns_its_id() {
        // Record #1 fails for a missing title, but its id still claims first
        // occurrence: #2 reusing it is a duplicate of the input batch even
        // though no accepted record carries the id.
        let mut first = valid_record(ID_A);
        first.remove("title");
        let records = vec![first, valid_record(ID_A)];
        let index = build_id_index(&records);

        let result = validate(&records[0], "b#1", 0, &index);
        assert_eq!(reason_of(result), RejectionReason::MissingField);

        let diag = validate(&records[1], "b#2", 1, &index)
            .expect_err("Second record duplicates the rejected first");
        assert_eq!(diag.reason, RejectionReason::DuplicateId);
        assert!(diag.detail.contains("duplicates record #1"));
    }

    #[test]
    fn test_fail_fast_is_deterministic() {
        // Missing title AND malformed recipe_id: title is checked first, so
        // the reported reason must be missing_field on every run.
        let mut record = valid_record(ID_A);
        record.remove("title");
        record.insert("recipe_id".into(), json!("garbage"));

        for _ in 0..50 {
            let result = validate(&record, "b#1", 0, &IdIndex::new());
            assert_eq!(reason_of(result), RejectionReason::MissingField);
        }
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let mut record = valid_record(ID_A);
        record.insert("nutrition_info".into(), json!({"calories": 350}));
        let index = build_id_index(std::slice::from_ref(&record));
        assert!(validate(&record, "b#1", 0, &index).is_ok());
    }
}
