use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level ETL configuration read from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EtlConfig {
    #[serde(default)]
    pub enrichment: EnrichmentParams,
}

impl EtlConfig {
    pub fn validate(&self) -> Result<()> {
        self.enrichment.validate()
    }
}

/// Parameters for the enrichment engine.
///
/// The complexity formula is deliberately configuration, not code: the score
/// is `direction_weight * |directions| + ingredient_weight * |ingredients|`,
/// and the difficulty flag is `easy` below `easy_threshold`, `medium` below
/// `medium_threshold`, `hard` otherwise.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EnrichmentParams {
    #[serde(default = "default_ingredient_weight")]
    pub ingredient_weight: f64,
    #[serde(default = "default_direction_weight")]
    pub direction_weight: f64,
    #[serde(default = "default_easy_threshold")]
    pub easy_threshold: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
    /// Seconds assumed for a direction step that mentions no duration.
    #[serde(default = "default_fallback_step_seconds")]
    pub fallback_step_seconds: u32,
}

fn default_ingredient_weight() -> f64 {
    0.4
}
fn default_direction_weight() -> f64 {
    0.6
}
fn default_easy_threshold() -> f64 {
    4.0
}
fn default_medium_threshold() -> f64 {
    8.0
}
fn default_fallback_step_seconds() -> u32 {
    300
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        EnrichmentParams {
            ingredient_weight: default_ingredient_weight(),
            direction_weight: default_direction_weight(),
            easy_threshold: default_easy_threshold(),
            medium_threshold: default_medium_threshold(),
            fallback_step_seconds: default_fallback_step_seconds(),
        }
    }
}

impl EnrichmentParams {
    pub fn validate(&self) -> Result<()> {
        // Non-negative weights keep the score monotonic in both counts.
        for (name, weight) in [
            ("ingredient_weight", self.ingredient_weight),
            ("direction_weight", self.direction_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(PipelineError::ConfigValidationError(format!(
                    "EnrichmentParams: {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        for (name, thr) in [
            ("easy_threshold", self.easy_threshold),
            ("medium_threshold", self.medium_threshold),
        ] {
            if !thr.is_finite() || thr <= 0.0 {
                return Err(PipelineError::ConfigValidationError(format!(
                    "EnrichmentParams: {} must be greater than 0.0, got {}",
                    name, thr
                )));
            }
        }
        if self.easy_threshold >= self.medium_threshold {
            return Err(PipelineError::ConfigValidationError(format!(
                "EnrichmentParams: easy_threshold ({}) must be less than medium_threshold ({})",
                self.easy_threshold, self.medium_threshold
            )));
        }
        Ok(())
    }
}

/// Loads and parses the ETL configuration YAML file.
pub fn load_etl_config<P: AsRef<Path>>(config_path: P) -> Result<EtlConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read ETL config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let config: EtlConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse ETL config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}
