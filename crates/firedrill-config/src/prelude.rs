//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_config::prelude::*;` to import all essential types.

// Errors
pub use crate::{ConfigError, ConfigResult};

// Configuration
pub use crate::{
    Config, GatewaySection, LoadOptions, LoggingSection, ModelSection, PersistenceSection,
    ResolvedConfig, SimulationSection,
};
