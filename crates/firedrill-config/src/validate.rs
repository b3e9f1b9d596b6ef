//! Post-merge configuration validation.

use std::ops::RangeInclusive;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Provider names accepted in `model.provider`.
pub const PROVIDERS: [&str; 3] = ["workers-ai", "openai-compat", "none"];

const TICK_INTERVAL_MS: RangeInclusive<u64> = 100..=600_000;
const TIME_ACCELERATION: RangeInclusive<u32> = 1..=1000;
const MAX_TOKENS: RangeInclusive<u32> = 1..=4096;
const TEMPERATURE: RangeInclusive<f64> = 0.0..=2.0;
const TIMEOUT_SECS: RangeInclusive<u64> = 1..=120;
const HISTORY_MESSAGES: RangeInclusive<usize> = 0..=50;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_simulation(config)?;
    validate_model(config)?;
    validate_gateway(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}

fn in_range<T: PartialOrd + std::fmt::Display>(
    field: &str,
    value: T,
    range: &RangeInclusive<T>,
) -> ConfigResult<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(invalid(
        field,
        format!(
            "{value} is out of range; must be between {} and {}",
            range.start(),
            range.end()
        ),
    ))
}

fn validate_simulation(config: &Config) -> ConfigResult<()> {
    let s = &config.simulation;
    in_range("simulation.tick_interval_ms", s.tick_interval_ms, &TICK_INTERVAL_MS)?;
    in_range("simulation.time_acceleration", s.time_acceleration, &TIME_ACCELERATION)?;
    Ok(())
}

fn validate_model(config: &Config) -> ConfigResult<()> {
    let m = &config.model;

    if !PROVIDERS.contains(&m.provider.as_str()) {
        return Err(invalid(
            "model.provider",
            format!(
                "unsupported provider '{}'; expected one of: {}",
                m.provider,
                PROVIDERS.join(", ")
            ),
        ));
    }
    if m.provider != "none" && m.model.trim().is_empty() {
        return Err(invalid("model.model", "model name must not be empty".to_owned()));
    }
    in_range("model.max_tokens", m.max_tokens, &MAX_TOKENS)?;
    if !m.temperature.is_finite() {
        return Err(invalid("model.temperature", "temperature must be finite".to_owned()));
    }
    in_range("model.temperature", m.temperature, &TEMPERATURE)?;
    in_range("model.timeout_secs", m.timeout_secs, &TIMEOUT_SECS)?;
    in_range("model.history_messages", m.history_messages, &HISTORY_MESSAGES)?;
    Ok(())
}

fn validate_gateway(config: &Config) -> ConfigResult<()> {
    let g = &config.gateway;
    if g.bind.trim().is_empty() {
        return Err(invalid("gateway.bind", "bind address must not be empty".to_owned()));
    }
    if g.max_connections == 0 {
        return Err(invalid(
            "gateway.max_connections",
            "max_connections must be at least 1".to_owned(),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn unknown_provider() {
        let mut config = Config::default();
        config.model.provider = "claude".to_owned();
        assert_eq!(field_of(validate(&config)), "model.provider");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let mut config = Config::default();
        config.simulation.tick_interval_ms = 100;
        config.simulation.time_acceleration = 1000;
        config.model.max_tokens = 4096;
        config.model.temperature = 2.0;
        config.model.timeout_secs = 120;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn out_of_range_values() {
        let cases: [(&str, fn(&mut Config)); 5] = [
            ("simulation.time_acceleration", |c| c.simulation.time_acceleration = 0),
            ("model.max_tokens", |c| c.model.max_tokens = 5000),
            ("model.temperature", |c| c.model.temperature = 2.5),
            ("model.timeout_secs", |c| c.model.timeout_secs = 0),
            ("gateway.max_connections", |c| c.gateway.max_connections = 0),
        ];
        for (field, mutate) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert_eq!(field_of(validate(&config)), field);
        }
    }

    #[test]
    fn nan_temperature_is_rejected() {
        let mut config = Config::default();
        config.model.temperature = f64::NAN;
        assert_eq!(field_of(validate(&config)), "model.temperature");
    }

    #[test]
    fn log_level_and_format() {
        let mut config = Config::default();
        config.logging.level = "WARN".to_owned();
        assert!(validate(&config).is_ok());

        config.logging.level = "loud".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.level");

        config.logging.level = "info".to_owned();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
