//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_runtime::prelude::*;` to import all essential types.

// Errors
pub use crate::{RuntimeError, RuntimeResult};

// Runtime
pub use crate::{IncidentRuntime, RuntimeConfig, SessionStore};

// Commands
pub use crate::{Command, CommandError, CommandResult};
