//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.firedrill/config.toml` (user)
//! 3. Merge the explicit `--config` file
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize the merged tree → `Config`
//! 6. Validate

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{EnvVars, apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{FileFields, deep_merge};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
pub const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Inputs to [`load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// File passed with `--config`; must exist.
    pub explicit_path: Option<PathBuf>,
    /// Directory holding the user config (normally `~/.firedrill`). `None`
    /// skips the user layer.
    pub user_dir: Option<PathBuf>,
    /// Environment snapshot.
    pub env: EnvVars,
}

impl LoadOptions {
    /// Options for the running process: real home directory and
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if the home directory cannot be
    /// determined.
    pub fn from_process(explicit: Option<&Path>) -> ConfigResult<Self> {
        Ok(Self {
            explicit_path: explicit.map(Path::to_path_buf),
            user_dir: Some(home_directory()?.join(".firedrill")),
            env: collect_env_vars(),
        })
    }
}

/// Load the configuration with layered file precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed or missing
/// (explicit file only), or if the final merged configuration fails
/// validation.
pub fn load(options: &LoadOptions) -> ConfigResult<ResolvedConfig> {
    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut file_fields = FileFields::new();
    let mut loaded_files = Vec::new();

    // 2. User config.
    if let Some(dir) = &options.user_dir {
        let path = dir.join("config.toml");
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge(&mut merged, &overlay, "", &mut file_fields);
            info!(path = %path.display(), "loaded user config");
            loaded_files.push(path);
        }
    }

    // 3. Explicit config.
    if let Some(path) = &options.explicit_path {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay, "", &mut file_fields);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path.clone());
    }

    // 4. Env fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &file_fields, &options.env)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {size} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> LoadOptions {
        LoadOptions {
            explicit_path: None,
            user_dir: Some(dir.to_path_buf()),
            env: EnvVars::new(),
        }
    }

    #[test]
    fn defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load(&options(dir.path())).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
    }

    #[test]
    fn explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[gateway]\nport = 9001\n[simulation]\nseed = 7\n",
        )
        .unwrap();
        let explicit = dir.path().join("drill.toml");
        std::fs::write(&explicit, "[gateway]\nport = 9002\n").unwrap();

        let resolved = load(&LoadOptions {
            explicit_path: Some(explicit.clone()),
            ..options(dir.path())
        })
        .unwrap();

        assert_eq!(resolved.config.gateway.port, 9002);
        assert_eq!(resolved.config.simulation.seed, Some(7));
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(resolved.loaded_files[1], explicit);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&LoadOptions {
            explicit_path: Some(dir.path().join("nope.toml")),
            ..options(dir.path())
        });
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn env_does_not_override_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[gateway]\nport = 9001\n").unwrap();
        let mut opts = options(dir.path());
        opts.env.insert("FIREDRILL_PORT".to_owned(), "7000".to_owned());
        opts.env
            .insert("FIREDRILL_MODEL_PROVIDER".to_owned(), "none".to_owned());

        let config = load(&opts).unwrap().config;
        assert_eq!(config.gateway.port, 9001);
        assert_eq!(config.model.provider, "none");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[simulation]\ntick_interval_ms = 5\n",
        )
        .unwrap();
        let result = load(&options(dir.path()));
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { field, .. }) if field == "simulation.tick_interval_ms"
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[gateway\nport = ").unwrap();
        assert!(matches!(
            load(&options(dir.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
