use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for pipeline operations.
///
/// Record-level rejections are NOT errors: they travel as
/// `ValidationDiagnostic` values inside the per-record loop and never cross
/// the orchestrator boundary. Everything here is batch-level.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Parquet error: {source}")]
    ParquetError {
        #[from]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow conversion error: {source}")]
    ArrowError {
        #[from]
        source: arrow::error::ArrowError,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// The raw batch could not be read at all. The batch never starts;
    /// the caller retries.
    #[error("Failed to fetch raw batch from '{source_ref}': {detail}")]
    SourceFetchFailure { source_ref: String, detail: String },

    /// Publishing a partition artifact failed. The whole batch is the
    /// atomicity boundary, so the caller re-runs the batch as a unit.
    #[error("Failed to publish partition '{partition}': {source}")]
    WriteFailure {
        partition: String,
        source: Box<PipelineError>,
    },

    /// A pipeline stage received data that should have been impossible after
    /// validation. Indicates an orchestrator ordering bug; aborts the batch.
    #[error("Internal invariant violated at '{record_ref}': {detail}")]
    InvariantViolation { record_ref: String, detail: String },

    #[error("Queueing system error: {0}")]
    QueueError(String),

    #[error("Dead-letter sink error for batch '{batch_id}': {detail}")]
    DeadLetterFailure { batch_id: String, detail: String },
}

impl PipelineError {
    /// Whether re-invoking the batch is a sensible reaction to this error.
    /// Transient collaborator failures are retryable; config problems and
    /// invariant violations are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceFetchFailure { .. }
                | PipelineError::WriteFailure { .. }
                | PipelineError::QueueError(_)
                | PipelineError::DeadLetterFailure { .. }
                | PipelineError::IoError { .. }
        )
    }
}

impl From<lapin::Error> for PipelineError {
    fn from(err: lapin::Error) -> Self {
        PipelineError::QueueError(err.to_string())
    }
}
