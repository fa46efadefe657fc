use std::collections::BTreeSet;

use serde_json::Value;

use crate::data_model::{CanonicalRecipe, RawRecord};
use crate::error::{PipelineError, Result};

/// Builds a canonical recipe from a raw record that already passed
/// validation.
///
/// Normalization: all strings are whitespace-trimmed; tags are lower-cased
/// and deduplicated into a set. Ingredient and direction order is preserved
/// exactly as given; order is meaningful and must round-trip unchanged.
///
/// Calling this on a record that would fail validation is an orchestrator
/// ordering bug: it returns `InvariantViolation`, which aborts the batch
/// rather than risking silent corruption.
pub fn extract(raw: &RawRecord, record_ref: &str) -> Result<CanonicalRecipe> {
    let title = required_string(raw, "title", record_ref)?;
    let ingredients = required_string_list(raw, "ingredients", record_ref)?;
    let directions = required_string_list(raw, "directions", record_ref)?;
    let recipe_id = required_string(raw, "recipe_id", record_ref)?;

    // Tags are optional input; absent or null means no tags.
    let tags: BTreeSet<String> = match raw.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::Null) | None => BTreeSet::new(),
        Some(other) => {
            return Err(invariant(
                record_ref,
                format!("Field 'tags' is not a list: {:?}", other),
            ))
        }
    };

    Ok(CanonicalRecipe {
        recipe_id,
        title,
        ingredients,
        directions,
        tags,
    })
}

fn required_string(raw: &RawRecord, field: &str, record_ref: &str) -> Result<String> {
    match raw.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(invariant(
            record_ref,
            format!(
                "Field '{}' is missing, empty, or not a string after validation: {:?}",
                field, other
            ),
        )),
    }
}

fn required_string_list(raw: &RawRecord, field: &str, record_ref: &str) -> Result<Vec<String>> {
    let items = match raw.get(field) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        other => {
            return Err(invariant(
                record_ref,
                format!(
                    "Field '{}' is missing or not a non-empty list after validation: {:?}",
                    field, other
                ),
            ))
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.trim().to_string()),
            other => Err(invariant(
                record_ref,
                format!("Field '{}' holds a non-string element: {:?}", field, other),
            )),
        })
        .collect()
}

fn invariant(record_ref: &str, detail: String) -> PipelineError {
    PipelineError::InvariantViolation {
        record_ref: record_ref.to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("Test record must be a JSON object, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_normalizes_and_preserves_order() {
        let record = raw(json!({
            "title": "  Beef Stew  ",
            "ingredients": ["beef ", " carrots", "potatoes", "onion"],
            "directions": ["Brown the beef.", "Add vegetables.", "Simmer for 2 hours."],
            "tags": ["Dinner", " COMFORT food ", "dinner"],
            "recipe_id": "7c9e82bd-9ed4-44d0-a9a0-8215b23eb3ad",
        }));

        let canonical = extract(&record, "b#1").expect("Valid record must extract");

        assert_eq!(canonical.title, "Beef Stew");
        // Order exactly as given, whitespace trimmed.
        assert_eq!(
            canonical.ingredients,
            vec!["beef", "carrots", "potatoes", "onion"]
        );
        assert_eq!(
            canonical.directions,
            vec!["Brown the beef.", "Add vegetables.", "Simmer for 2 hours."]
        );
        // Tags lower-cased and deduplicated.
        let tags: Vec<&str> = canonical.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["comfort food", "dinner"]);
    }

    #[test]
    fn test_missing_tags_becomes_empty_set() {
        let record = raw(json!({
            "title": "Toast",
            "ingredients": ["bread"],
            "directions": ["Toast the bread."],
            "recipe_id": "7c9e82bd-9ed4-44d0-a9a0-8215b23eb3ad",
        }));
        let canonical = extract(&record, "b#1").expect("Tags are optional");
        assert!(canonical.tags.is_empty());
    }

    #[test]
    fn test_extract_on_invalid_record_is_invariant_violation() {
        // The orchestrator must never call extract before validate; if it
        // does, the error is fatal rather than a per-record rejection.
        let record = raw(json!({
            "ingredients": ["flour"],
            "directions": ["Mix."],
            "recipe_id": "7c9e82bd-9ed4-44d0-a9a0-8215b23eb3ad",
        }));
        match extract(&record, "b#4") {
            Err(PipelineError::InvariantViolation { record_ref, detail }) => {
                assert_eq!(record_ref, "b#4");
                assert!(detail.contains("'title'"));
            }
            other => panic!("Expected InvariantViolation, got {:?}", other),
        }
    }
}
