#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for Firedrill.
//!
//! # Usage
//!
//! ```rust,no_run
//! use firedrill_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("ticking every {}ms", resolved.config.simulation.tick_interval_ms);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** passed with `--config`
//! 2. **User** (`~/.firedrill/config.toml`)
//! 3. **Environment variables** (`FIREDRILL_*`, `CLOUDFLARE_*`, `OPENAI_API_KEY`),
//!    only for fields no file set
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other firedrill crates. Conversion into
//! provider and narrator settings happens where the runtime is built.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered TOML merging.
pub mod merge;
pub mod prelude;
/// Resolved configuration display.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadOptions;
pub use show::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions::from_process(explicit)?)
    }
}
