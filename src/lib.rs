// Batch validation-and-partitioning ETL core for recipe data.
//
// Raw JSON records flow through validate -> extract -> enrich per record;
// valid records land in difficulty-partitioned Parquet artifacts, invalid
// ones in a dead-letter sink with diagnostics, and every batch yields an
// explicit accounting result.

pub mod config;
pub mod data_model;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod server;
pub mod utils;
