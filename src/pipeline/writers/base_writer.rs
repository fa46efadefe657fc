use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::data_model::{Difficulty, EnrichedRecipe};
use crate::error::Result;

/// Trait for the partition output collaborator: an object-storage-like put
/// with atomic publish semantics.
///
/// Implementations must guarantee that downstream readers observe either a
/// complete partition artifact or none at all, and that re-running the same
/// batch overwrites each artifact wholesale instead of appending.
pub trait PartitionStore {
    /// Serializes the enriched batch into one artifact per difficulty
    /// partition and returns the published location of each.
    fn write_batch(
        &self,
        batch_id: &str,
        records: &[EnrichedRecipe],
    ) -> Result<BTreeMap<Difficulty, PathBuf>>;
}
