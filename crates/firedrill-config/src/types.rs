//! Configuration types.
//!
//! Every struct implements [`Default`] with the values in `defaults.toml`, so
//! a bare `[section]` header produces a working configuration.

use std::path::PathBuf;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick cadence and reproducibility.
    pub simulation: SimulationSection,
    /// Narration model selection.
    pub model: ModelSection,
    /// JSON-RPC server.
    pub gateway: GatewaySection,
    /// Session snapshots.
    pub persistence: PersistenceSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// SimulationSection
// ---------------------------------------------------------------------------

/// Simulation clock settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Wall-clock milliseconds between ticks.
    pub tick_interval_ms: u64,
    /// Simulated seconds per wall-clock second.
    pub time_acceleration: u32,
    /// Fixed seed for reproducible drills. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Stop the clock while no observer is connected.
    pub stop_when_idle: bool,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5000,
            time_acceleration: 10,
            seed: None,
            stop_when_idle: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ModelSection
// ---------------------------------------------------------------------------

/// Narration model selection and limits.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// `"workers-ai"`, `"openai-compat"` or `"none"`.
    pub provider: String,
    /// Model name sent to the provider API.
    pub model: String,
    /// API key or token. Prefer environment variables over storing this in
    /// a file.
    pub api_key: Option<String>,
    /// Endpoint override.
    pub api_url: Option<String>,
    /// Cloudflare account id (Workers AI only).
    pub account_id: Option<String>,
    /// Token limit per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Seconds allowed for one generation.
    pub timeout_secs: u64,
    /// Transcript entries sent as context.
    pub history_messages: usize,
}

impl std::fmt::Debug for ModelSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSection")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("api_url", &self.api_url)
            .field("has_account_id", &self.account_id.is_some())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("history_messages", &self.history_messages)
            .finish()
    }
}

impl Serialize for ModelSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelSection", 8)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("model", &self.model)?;
        // api_key is never written out.
        if let Some(url) = &self.api_url {
            state.serialize_field("api_url", url)?;
        }
        if let Some(account) = &self.account_id {
            state.serialize_field("account_id", account)?;
        }
        state.serialize_field("max_tokens", &self.max_tokens)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("timeout_secs", &self.timeout_secs)?;
        state.serialize_field("history_messages", &self.history_messages)?;
        state.end()
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            provider: "workers-ai".to_owned(),
            model: "@cf/meta/llama-3.1-8b-instruct".to_owned(),
            api_key: None,
            api_url: None,
            account_id: None,
            max_tokens: 300,
            temperature: 0.7,
            timeout_secs: 8,
            history_messages: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// GatewaySection
// ---------------------------------------------------------------------------

/// JSON-RPC server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Address to bind.
    pub bind: String,
    /// Port to bind. `0` picks a free port.
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: u32,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_owned(),
            port: 8787,
            max_connections: 64,
        }
    }
}

impl GatewaySection {
    /// `bind:port` string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ---------------------------------------------------------------------------
// PersistenceSection
// ---------------------------------------------------------------------------

/// Session snapshot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    /// Write the session to disk after every command and tick.
    pub enabled: bool,
    /// Snapshot directory. `None` uses `~/.firedrill/state`.
    pub state_dir: Option<String>,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            enabled: true,
            state_dir: None,
        }
    }
}

impl PersistenceSection {
    /// Snapshot directory, or `None` if persistence is off or no home
    /// directory can be found.
    #[must_use]
    pub fn resolved_state_dir(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        match &self.state_dir {
            Some(dir) => Some(PathBuf::from(dir)),
            None => directories::BaseDirs::new()
                .map(|d| d.home_dir().join(".firedrill").join("state")),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["firedrill_runtime=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
