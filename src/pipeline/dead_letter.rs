use std::fs;
use std::path::{Path, PathBuf};

use crate::data_model::ValidationDiagnostic;
use crate::error::{PipelineError, Result};

/// Trait for the dead-letter collaborator: stores the diagnostics of every
/// record the batch rejected, for later inspection.
pub trait DeadLetterSink {
    fn put(&mut self, batch_id: &str, diagnostics: &[ValidationDiagnostic]) -> Result<()>;
}

/// Writes one JSON artifact of diagnostics per batch under a dead-letter
/// directory. Keyed by batch id, so re-running a batch overwrites rather
/// than duplicates.
#[derive(Debug, Clone)]
pub struct JsonDeadLetterSink {
    dir: PathBuf,
}

impl JsonDeadLetterSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        JsonDeadLetterSink {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifact_path(&self, batch_id: &str) -> PathBuf {
        self.dir.join(format!("{}.rejected.json", batch_id))
    }
}

impl DeadLetterSink for JsonDeadLetterSink {
    fn put(&mut self, batch_id: &str, diagnostics: &[ValidationDiagnostic]) -> Result<()> {
        if diagnostics.is_empty() {
            return Ok(());
        }

        let failure = |detail: String| PipelineError::DeadLetterFailure {
            batch_id: batch_id.to_string(),
            detail,
        };

        fs::create_dir_all(&self.dir).map_err(|e| failure(e.to_string()))?;

        let path = self.artifact_path(batch_id);
        let payload =
            serde_json::to_vec_pretty(diagnostics).map_err(|e| failure(e.to_string()))?;
        fs::write(&path, payload).map_err(|e| failure(e.to_string()))?;

        Ok(())
    }
}
