pub mod enrichment;
pub mod runner;

pub use enrichment::{load_etl_config, EnrichmentParams, EtlConfig};
