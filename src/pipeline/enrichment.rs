use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EnrichmentParams;
use crate::data_model::{CanonicalRecipe, Difficulty, EnrichedRecipe};

// Matches "<number> <unit>" mentions like "30 minutes" or "1 hour"; units
// outside unit_seconds (e.g. "cups") are matched but ignored.
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*([A-Za-z]+)").expect("time pattern must compile"));

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "hours" | "hour" => Some(3600),
        "minutes" | "minute" => Some(60),
        "seconds" | "second" => Some(1),
        _ => None,
    }
}

/// Weighted count score, monotonically non-decreasing in both counts as long
/// as the configured weights are non-negative (enforced by config
/// validation).
pub fn complexity_score(params: &EnrichmentParams, canonical: &CanonicalRecipe) -> f64 {
    params.direction_weight * canonical.directions.len() as f64
        + params.ingredient_weight * canonical.ingredients.len() as f64
}

pub fn difficulty_flag(params: &EnrichmentParams, score: f64) -> Difficulty {
    if score < params.easy_threshold {
        Difficulty::Easy
    } else if score < params.medium_threshold {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Estimates total preparation time in whole minutes, rounded up.
///
/// Each direction is scanned for `<number> <unit>` mentions (hours, minutes,
/// seconds) which are summed; a direction with no recognized mention
/// contributes the configured fallback. Adding a direction never decreases
/// the estimate.
pub fn time_estimate_minutes(params: &EnrichmentParams, directions: &[String]) -> u32 {
    let mut total_seconds: u64 = 0;

    for direction in directions {
        let mut any_match = false;
        for caps in TIME_PATTERN.captures_iter(direction) {
            let Some(seconds_per_unit) = unit_seconds(&caps[2]) else {
                continue;
            };
            let amount: u64 = caps[1].parse().unwrap_or(0);
            total_seconds = total_seconds.saturating_add(amount.saturating_mul(seconds_per_unit));
            any_match = true;
        }
        if !any_match {
            total_seconds = total_seconds.saturating_add(params.fallback_step_seconds as u64);
        }
    }

    total_seconds.div_ceil(60).min(u32::MAX as u64) as u32
}

/// Computes all derived fields for a canonical recipe. Deterministic, pure,
/// and total: a structurally valid canonical recipe always enriches.
pub fn enrich(canonical: CanonicalRecipe, params: &EnrichmentParams) -> EnrichedRecipe {
    let score = complexity_score(params, &canonical);
    let flag = difficulty_flag(params, score);
    let time_estimate = time_estimate_minutes(params, &canonical.directions);

    EnrichedRecipe {
        recipe: canonical,
        complexity_score: score,
        difficulty_flag: flag,
        time_estimate,
    }
}
