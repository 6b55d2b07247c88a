use crate::config::types::{Config, ScheduleConfig, ScoringConfig, StorageConfig, UpdateConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_update_config(&config.update)?;
    validate_schedule_config(&config.schedule)?;
    validate_scoring_config(&config.scoring)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates graph update configuration
fn validate_update_config(config: &UpdateConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.partitions < 1 {
        return Err(ConfigError::Validation(format!(
            "partitions must be >= 1, got {}",
            config.partitions
        )));
    }

    if config.max_fetch_interval <= 0 {
        return Err(ConfigError::Validation(format!(
            "max_fetch_interval must be positive, got {}s",
            config.max_fetch_interval
        )));
    }

    Ok(())
}

/// Validates fetch schedule configuration
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if !matches!(config.class.as_str(), "default" | "adaptive" | "news") {
        return Err(ConfigError::UnknownClass {
            kind: "fetch schedule",
            name: config.class.clone(),
        });
    }

    if config.min_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "min_interval must be >= 1s, got {}s",
            config.min_interval
        )));
    }

    if config.min_interval > config.max_interval {
        return Err(ConfigError::Validation(format!(
            "min_interval ({}s) cannot exceed max_interval ({}s)",
            config.min_interval, config.max_interval
        )));
    }

    if config.default_interval < 1 || config.seed_max_interval < 1 {
        return Err(ConfigError::Validation(
            "default_interval and seed_max_interval must be >= 1s".to_string(),
        ));
    }

    validate_rate("inc_rate", config.inc_rate)?;
    validate_rate("dec_rate", config.dec_rate)?;
    validate_rate("sync_delta_rate", config.sync_delta_rate)?;

    Ok(())
}

/// Validates scoring configuration
fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if !matches!(config.class.as_str(), "opic" | "link") {
        return Err(ConfigError::UnknownClass {
            kind: "scoring filter",
            name: config.class.clone(),
        });
    }

    for (name, value) in [
        ("internal_link_factor", config.internal_link_factor),
        ("external_link_factor", config.external_link_factor),
        ("normalize_score", config.normalize_score),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Rates outside [0, 1) make the adaptive interval diverge or collapse
fn validate_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&rate) {
        return Err(ConfigError::Validation(format!(
            "{} must be in [0, 1), got {}",
            name, rate
        )));
    }
    Ok(())
}
