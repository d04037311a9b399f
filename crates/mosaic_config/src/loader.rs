//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{AnnealConfig, ProjectConfig};
use std::path::Path;

/// Loads and validates a `mosaic.toml` configuration from a project directory.
///
/// Reads `<project_dir>/mosaic.toml`, parses it, and validates required
/// fields and value ranges.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join("mosaic.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `mosaic.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are usable.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.design.name.is_empty() {
        return Err(ConfigError::MissingField("design.name".to_string()));
    }
    if config.design.blocks.is_empty() {
        return Err(ConfigError::MissingField("design.blocks".to_string()));
    }
    if config.design.nets.is_empty() {
        return Err(ConfigError::MissingField("design.nets".to_string()));
    }
    if config.outline.width <= 0.0 || config.outline.height <= 0.0 {
        return Err(ConfigError::ValidationError(
            "outline dimensions must be positive".to_string(),
        ));
    }
    if config.shape.min_aspect_ratio <= 0.0 || config.shape.min_aspect_ratio > 1.0 {
        return Err(ConfigError::ValidationError(
            "shape.min_aspect_ratio must be in (0, 1]".to_string(),
        ));
    }
    let move_probs = config.placement.resize_prob
        + config.placement.pos_swap_prob
        + config.placement.neg_swap_prob;
    if !(0.0..=1.0).contains(&move_probs) {
        return Err(ConfigError::ValidationError(
            "placement move probabilities must sum to at most 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.pin_align.flip_prob) {
        return Err(ConfigError::ValidationError(
            "pin_align.flip_prob must be in [0, 1]".to_string(),
        ));
    }
    for (stage, anneal) in [
        ("shape", &config.shape.anneal),
        ("placement", &config.placement.anneal),
        ("pin_align", &config.pin_align.anneal),
    ] {
        validate_anneal(stage, anneal)?;
    }
    Ok(())
}

fn validate_anneal(stage: &str, anneal: &AnnealConfig) -> Result<(), ConfigError> {
    if anneal.max_steps == 0 || anneal.moves_per_step == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{stage}.anneal steps and moves per step must be positive"
        )));
    }
    if !(anneal.cooling_rate > 0.0 && anneal.cooling_rate < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "{stage}.anneal.cooling_rate must be in (0, 1)"
        )));
    }
    if !(anneal.init_accept_prob > 0.0 && anneal.init_accept_prob < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "{stage}.anneal.init_accept_prob must be in (0, 1)"
        )));
    }
    Ok(())
}
