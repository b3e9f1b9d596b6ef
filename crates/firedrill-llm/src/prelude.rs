//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_llm::prelude::*;` to import all essential types.

// Errors
pub use crate::{LlmError, LlmResult};

// Provider trait and selection
pub use crate::{LlmProvider, ProviderConfig, ProviderKind, create_provider};

// Messages
pub use crate::{LlmResponse, Message, MessageRole};
