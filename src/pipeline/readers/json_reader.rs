use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::data_model::RawRecord;
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::BatchSource;

/// Reads a raw batch from a local JSON file.
///
/// Two intake shapes are accepted: a top-level JSON array of objects, or one
/// JSON object per line (NDJSON). Anything else is a malformed batch and
/// fails as a whole. Per-record problems are the validator's job, but a
/// file we cannot parse into records never starts processing.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonFileSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn fetch_failure(&self, detail: impl Into<String>) -> PipelineError {
        PipelineError::SourceFetchFailure {
            source_ref: self.source_ref(),
            detail: detail.into(),
        }
    }

    fn parse_array(&self, content: &str) -> Result<Vec<RawRecord>> {
        let values: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| self.fetch_failure(format!("Invalid JSON array: {}", e)))?;

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(map) => Ok(map),
                other => Err(self.fetch_failure(format!(
                    "Element {} is not a JSON object: {}",
                    i, other
                ))),
            })
            .collect()
    }

    fn parse_lines(&self, content: &str) -> Result<Vec<RawRecord>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_no, line)| {
                serde_json::from_str::<RawRecord>(line).map_err(|e| {
                    self.fetch_failure(format!("Line {} is not a JSON object: {}", line_no + 1, e))
                })
            })
            .collect()
    }
}

impl BatchSource for JsonFileSource {
    fn source_ref(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<RawRecord>> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.fetch_failure(format!("Read failed: {}", e)))?;

        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            self.parse_array(&content)
        } else {
            self.parse_lines(&content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_for(content: &str) -> (NamedTempFile, JsonFileSource) {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "{}", content).expect("Failed to write temp file");
        let source = JsonFileSource::new(file.path());
        (file, source)
    }

    #[test]
    fn test_reads_json_array() {
        let (_file, source) = source_for(r#"[{"title": "A"}, {"title": "B"}]"#);
        let records = source.fetch().expect("Array batch should parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["title"], "B");
    }

    #[test]
    fn test_reads_ndjson() {
        let (_file, source) = source_for("{\"title\": \"A\"}\n\n{\"title\": \"B\"}\n");
        let records = source.fetch().expect("NDJSON batch should parse");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_source_fetch_failure() {
        let source = JsonFileSource::new("does/not/exist.json");
        match source.fetch() {
            Err(e @ PipelineError::SourceFetchFailure { .. }) => {
                assert!(e.is_retryable());
            }
            other => panic!("Expected SourceFetchFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_array_element_fails_batch() {
        let (_file, source) = source_for(r#"[{"title": "A"}, 42]"#);
        match source.fetch() {
            Err(PipelineError::SourceFetchFailure { detail, .. }) => {
                assert!(detail.contains("Element 1"));
            }
            other => panic!("Expected SourceFetchFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_line_fails_batch() {
        let (_file, source) = source_for("{\"title\": \"A\"}\nnot json\n");
        match source.fetch() {
            Err(PipelineError::SourceFetchFailure { detail, .. }) => {
                assert!(detail.contains("Line 2"));
            }
            other => panic!("Expected SourceFetchFailure, got {:?}", other),
        }
    }
}
