//! Bridge from `firedrill_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates. This
//! module translates its sections into the settings the LLM provider, the
//! narrator and the runtime take. The CLI and the gateway both go through
//! here.

use std::path::PathBuf;
use std::time::Duration;

use firedrill_config::Config;
use firedrill_core::SimulationClock;
use firedrill_llm::{ProviderConfig, ProviderKind, create_provider};
use firedrill_narration::{Narrator, NarratorConfig};

use crate::error::RuntimeResult;

/// Settings for [`crate::IncidentRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Tick period and acceleration.
    pub clock: SimulationClock,
    /// Fixed seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Stop the clock while nobody is subscribed.
    pub stop_when_idle: bool,
    /// Snapshot directory. `None` disables persistence.
    pub state_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clock: SimulationClock::default(),
            seed: None,
            stop_when_idle: true,
            state_dir: None,
        }
    }
}

/// Convert config to [`RuntimeConfig`].
#[must_use]
pub fn to_runtime_config(cfg: &Config) -> RuntimeConfig {
    RuntimeConfig {
        clock: SimulationClock::new(
            Duration::from_millis(cfg.simulation.tick_interval_ms),
            cfg.simulation.time_acceleration,
        ),
        seed: cfg.simulation.seed,
        stop_when_idle: cfg.simulation.stop_when_idle,
        state_dir: cfg.persistence.resolved_state_dir(),
    }
}

/// Convert config to [`ProviderConfig`].
///
/// The API key already includes env var fallbacks applied by
/// `Config::load`. A missing key is not an error here; the provider reports
/// it on first use and narration falls back.
///
/// # Errors
///
/// Returns [`crate::RuntimeError::LlmError`] for an unknown provider name.
pub fn to_provider_config(cfg: &Config) -> RuntimeResult<ProviderConfig> {
    let kind: ProviderKind = cfg.model.provider.parse()?;
    Ok(ProviderConfig {
        kind,
        model: cfg.model.model.clone(),
        api_key: cfg.model.api_key.clone().filter(|k| !k.is_empty()),
        api_url: cfg.model.api_url.clone(),
        account_id: cfg.model.account_id.clone(),
        temperature: cfg.model.temperature,
        // Outlasts the narrator's own timeout.
        request_timeout: Duration::from_secs(cfg.model.timeout_secs.saturating_add(2)),
    })
}

/// Convert config to [`NarratorConfig`].
#[must_use]
pub fn to_narrator_config(cfg: &Config) -> NarratorConfig {
    NarratorConfig {
        max_tokens: cfg.model.max_tokens,
        timeout: Duration::from_secs(cfg.model.timeout_secs),
        history_messages: cfg.model.history_messages,
    }
}

/// Build the narrator the config selects.
///
/// # Errors
///
/// Returns [`crate::RuntimeError::LlmError`] for an unknown provider or an HTTP
/// client that cannot be built.
pub fn build_narrator(cfg: &Config) -> RuntimeResult<Narrator> {
    let provider = create_provider(&to_provider_config(cfg)?)?;
    Ok(Narrator::new(provider, to_narrator_config(cfg)))
}
