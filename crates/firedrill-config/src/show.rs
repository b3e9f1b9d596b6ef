use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::types::Config;

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The configuration.
    pub config: Config,
    /// Files merged over the defaults, in load order.
    pub loaded_files: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Render as TOML for `config show`. The API key is never printed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::SerializeError`] if rendering fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        let mut out = String::new();
        if self.loaded_files.is_empty() {
            out.push_str("# sources: embedded defaults\n");
        } else {
            for path in &self.loaded_files {
                out.push_str(&format!("# loaded: {}\n", path.display()));
            }
        }
        if self.config.model.api_key.is_some() {
            out.push_str("# model.api_key: set (redacted)\n");
        }
        out.push('\n');
        out.push_str(&toml::to_string_pretty(&self.config)?);
        Ok(out)
    }
}
