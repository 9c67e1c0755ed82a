use std::path::Path;
use crate::errors::ForecastError;
use super::types::ForecastConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::{info, warn};

pub async fn parse_config(path: &Path) -> Result<ForecastConfig, ForecastError> {
    if !path.exists() {
        return Err(ForecastError::Configuration(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(ForecastError::Configuration("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Load the config at `path`, or fall back to defaults when no path is given.
pub async fn load_config(path: Option<&Path>) -> Result<ForecastConfig, ForecastError> {
    match path {
        Some(p) => parse_config(p).await,
        None => {
            info!("No config file given, using defaults");
            let config = ForecastConfig::default();
            validate_semantics(&config)?;
            Ok(config)
        }
    }
}

pub fn parse_config_str(content: &str) -> Result<ForecastConfig, ForecastError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // An empty document parses as null
    if yaml.is_null() {
        let config = ForecastConfig::default();
        validate_semantics(&config)?;
        return Ok(config);
    }

    validate_schema(&yaml)?;

    let config: ForecastConfig = serde_yaml::from_value(yaml)
        .map_err(|e| ForecastError::Configuration(format!("Invalid config: {}", e)))?;

    validate_semantics(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), ForecastError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| ForecastError::Configuration(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| ForecastError::Configuration(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only: typed parsing and semantic checks are authoritative
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Reject settings that parse but cannot drive a run.
fn validate_semantics(config: &ForecastConfig) -> Result<(), ForecastError> {
    let training = &config.training;
    if !(training.test_ratio > 0.0 && training.test_ratio < 1.0) {
        return Err(ForecastError::Configuration(format!(
            "training.test_ratio must be in (0, 1), got {}",
            training.test_ratio
        )));
    }
    if !(0.0..=1.0).contains(&training.decision_threshold) {
        return Err(ForecastError::Configuration(format!(
            "training.decision_threshold must be in [0, 1], got {}",
            training.decision_threshold
        )));
    }
    if !(training.learning_rate > 0.0 && training.learning_rate.is_finite()) || training.max_iter == 0 {
        return Err(ForecastError::Configuration(
            "training.learning_rate and training.max_iter must be positive".into(),
        ));
    }
    if !(training.l2 >= 0.0 && training.l2.is_finite()) {
        return Err(ForecastError::Configuration(format!(
            "training.l2 must be a finite value >= 0, got {}",
            training.l2
        )));
    }

    if config.fetch.rate_limit_per_minute == 0 {
        return Err(ForecastError::Configuration("fetch.rate_limit_per_minute must be > 0".into()));
    }
    if config.fetch.max_retries > 10 {
        return Err(ForecastError::Configuration(format!(
            "fetch.max_retries must be <= 10, got {}",
            config.fetch.max_retries
        )));
    }
    if config.fetch.request_timeout_secs == 0 {
        return Err(ForecastError::Configuration("fetch.request_timeout_secs must be > 0".into()));
    }

    if config.features.vocabulary_cap == 0 {
        return Err(ForecastError::Configuration("features.vocabulary_cap must be >= 1".into()));
    }
    if config.features.other_threshold == 0 {
        return Err(ForecastError::Configuration("features.other_threshold must be >= 1".into()));
    }

    if !config.sources.any_enabled() {
        return Err(ForecastError::Configuration("At least one source must be enabled".into()));
    }
    if config.sources.nvd.enabled && !(1..=2000).contains(&config.sources.nvd.results_per_page) {
        return Err(ForecastError::Configuration(
            "sources.nvd.results_per_page must be between 1 and 2000".into(),
        ));
    }

    Ok(())
}
