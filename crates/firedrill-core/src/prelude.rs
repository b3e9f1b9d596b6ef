//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{WorkflowError, WorkflowResult};

// Scenario
pub use crate::{AlertTeam, Region};

// Workflow
pub use crate::{IncidentPhase, IncidentSession, RegionWorkflow, WorkflowEvent, WorkflowState};

// Clock and randomness
pub use crate::{RandomSource, SeededRandom, SimulationClock};

// Transcript
pub use crate::{ChatMessage, Persona};

// Client-facing projection
pub use crate::SessionView;
