use crate::data_model::RawRecord;
use crate::error::Result;

/// Trait for the raw intake collaborator: an object-storage-like get
/// returning one bounded batch of raw records.
pub trait BatchSource {
    /// Human-readable reference to the batch location, used in diagnostics.
    fn source_ref(&self) -> String;

    /// Fetch the whole raw batch. Failure here means the batch never
    /// starts (`SourceFetchFailure`); the caller retries.
    fn fetch(&self) -> Result<Vec<RawRecord>>;
}
