use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Builder, ListBuilder, RecordBatch, StringBuilder, UInt32Builder,
};
use arrow::datatypes::{Field, Schema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::data_model::{Difficulty, EnrichedRecipe};
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::PartitionStore;

/// Writes enriched recipes as one Parquet artifact per difficulty partition.
///
/// Publish is atomic: each artifact is written to a `.tmp` sibling and then
/// renamed into place, so a crash mid-write leaves nothing observable at the
/// published path. Re-running the same batch replaces each artifact
/// wholesale, which makes at-least-once upstream delivery safe.
pub struct ParquetPartitionWriter {
    output_dir: PathBuf,
}

impl ParquetPartitionWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        ParquetPartitionWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Published location for one partition of one batch. The partition key
    /// is embedded in the path, Hive-style.
    pub fn partition_path(&self, flag: Difficulty, batch_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("difficulty={}", flag))
            .join(format!("{}.parquet", batch_id))
    }

    fn write_partition(
        &self,
        flag: Difficulty,
        batch_id: &str,
        records: &[&EnrichedRecipe],
    ) -> Result<PathBuf> {
        let final_path = self.partition_path(flag, batch_id);
        if let Some(partition_dir) = final_path.parent() {
            fs::create_dir_all(partition_dir)?;
        }

        // Same directory as the final path, so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = final_path.with_extension("parquet.tmp");

        let batch = build_record_batch(records)?;
        let file = File::create(&tmp_path)?;
        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        fs::rename(&tmp_path, &final_path)?;
        debug!(partition = %flag, path = %final_path.display(), rows = records.len(), "Published partition artifact");

        Ok(final_path)
    }
}

impl PartitionStore for ParquetPartitionWriter {
    fn write_batch(
        &self,
        batch_id: &str,
        records: &[EnrichedRecipe],
    ) -> Result<BTreeMap<Difficulty, PathBuf>> {
        let mut groups: BTreeMap<Difficulty, Vec<&EnrichedRecipe>> = BTreeMap::new();
        for record in records {
            groups.entry(record.difficulty_flag).or_default().push(record);
        }

        let mut outputs = BTreeMap::new();
        for (flag, group) in groups {
            let path = self
                .write_partition(flag, batch_id, &group)
                .map_err(|e| PipelineError::WriteFailure {
                    partition: flag.to_string(),
                    source: Box::new(e),
                })?;
            outputs.insert(flag, path);
        }

        Ok(outputs)
    }
}

fn build_record_batch(records: &[&EnrichedRecipe]) -> Result<RecordBatch> {
    let mut id_builder = StringBuilder::new();
    let mut title_builder = StringBuilder::new();
    let mut ingredients_builder = ListBuilder::new(StringBuilder::new());
    let mut directions_builder = ListBuilder::new(StringBuilder::new());
    let mut tags_builder = ListBuilder::new(StringBuilder::new());
    let mut score_builder = Float64Builder::new();
    let mut flag_builder = StringBuilder::new();
    let mut time_builder = UInt32Builder::new();

    for enriched in records {
        let recipe = &enriched.recipe;
        id_builder.append_value(&recipe.recipe_id);
        title_builder.append_value(&recipe.title);

        for ingredient in &recipe.ingredients {
            ingredients_builder.values().append_value(ingredient);
        }
        ingredients_builder.append(true);

        for direction in &recipe.directions {
            directions_builder.values().append_value(direction);
        }
        directions_builder.append(true);

        for tag in &recipe.tags {
            tags_builder.values().append_value(tag);
        }
        tags_builder.append(true);

        score_builder.append_value(enriched.complexity_score);
        flag_builder.append_value(enriched.difficulty_flag.as_str());
        time_builder.append_value(enriched.time_estimate);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(id_builder.finish()),
        Arc::new(title_builder.finish()),
        Arc::new(ingredients_builder.finish()),
        Arc::new(directions_builder.finish()),
        Arc::new(tags_builder.finish()),
        Arc::new(score_builder.finish()),
        Arc::new(flag_builder.finish()),
        Arc::new(time_builder.finish()),
    ];

    // Field types are taken from the finished arrays so the schema always
    // matches what the builders produced (list fields in particular).
    let names = [
        "recipe_id",
        "title",
        "ingredients",
        "directions",
        "tags",
        "complexity_score",
        "difficulty_flag",
        "time_estimate",
    ];
    let fields: Vec<Field> = names
        .iter()
        .zip(columns.iter())
        .map(|(name, column)| Field::new(*name, column.data_type().clone(), column.null_count() > 0))
        .collect();

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(batch)
}
