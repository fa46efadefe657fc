use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw record as received from the intake source: an untyped JSON object.
/// No invariants hold here. It exists only for the duration of one batch.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Output partition key, derived from the complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized recipe. Constructed only by the extractor from a
/// RawRecord that passed validation; all fields are present and typed.
///
/// Ingredient and direction order is semantically meaningful and must
/// round-trip unchanged. Tags are a deduplicated, lower-cased set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecipe {
    pub recipe_id: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub tags: BTreeSet<String>,
}

/// A canonical recipe plus derived fields. The derived fields are pure
/// functions of the ingredient/direction counts and are never mutated
/// independently of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecipe {
    #[serde(flatten)]
    pub recipe: CanonicalRecipe,
    pub complexity_score: f64,
    pub difficulty_flag: Difficulty,
    /// Whole minutes, rounded up.
    pub time_estimate: u32,
}

/// Why a record was rejected. One reason per record: validation is
/// fail-fast, so only the first failing check is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    MissingField,
    TypeMismatch,
    EmptyRequiredField,
    DuplicateId,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectionReason::MissingField => "missing_field",
            RejectionReason::TypeMismatch => "type_mismatch",
            RejectionReason::EmptyRequiredField => "empty_required_field",
            RejectionReason::DuplicateId => "duplicate_id",
        };
        f.write_str(s)
    }
}

/// Structured diagnostic for a rejected record, owned by the dead-letter
/// sink once the batch completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDiagnostic {
    /// Position-based reference into the source batch, e.g. "batch-7#3".
    pub record_reference: String,
    pub reason: RejectionReason,
    pub detail: String,
}

impl ValidationDiagnostic {
    pub fn new(record_reference: &str, reason: RejectionReason, detail: impl Into<String>) -> Self {
        ValidationDiagnostic {
            record_reference: record_reference.to_string(),
            reason,
            detail: detail.into(),
        }
    }
}

/// Batch-level accounting, immutable once returned. The only object that
/// survives past the batch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub failure_diagnostics: Vec<ValidationDiagnostic>,
    /// Written artifact per difficulty partition. Only partitions that
    /// received at least one record appear here.
    pub output_partitions: BTreeMap<Difficulty, PathBuf>,
}

/// Message emitted downstream once per successfully completed batch
/// (at-least-once delivery; consumers must tolerate duplicates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchNotification {
    pub batch_id: String,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub output_partitions: BTreeMap<Difficulty, PathBuf>,
    pub completed_at: DateTime<Utc>,
}

impl BatchNotification {
    pub fn from_result(result: &BatchResult) -> Self {
        BatchNotification {
            batch_id: result.batch_id.clone(),
            total: result.total,
            succeeded: result.succeeded,
            failed: result.failed,
            output_partitions: result.output_partitions.clone(),
            completed_at: Utc::now(),
        }
    }
}
