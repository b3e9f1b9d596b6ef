//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_narration::prelude::*;` to import all essential types.

// Errors
pub use crate::{NarrationError, NarrationResult};

// Narration
pub use crate::{IncidentBrief, Narration, NarrationRequest, NarrationSource, Narrator, NarratorConfig};
