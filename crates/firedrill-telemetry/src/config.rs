//! Conversion from the `[logging]` config section.

use firedrill_config::LoggingSection;

use crate::error::TelemetryResult;
use crate::logging::{LogConfig, LogFormat};

impl LogConfig {
    /// Log settings from a `[logging]` section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TelemetryError::ConfigError`] if the format is unknown.
    pub fn from_section(section: &LoggingSection) -> TelemetryResult<Self> {
        let format: LogFormat = section.format.parse()?;
        Ok(Self {
            level: section.level.to_ascii_lowercase(),
            format,
            directives: section.directives.clone(),
            ..Self::default()
        })
    }
}
