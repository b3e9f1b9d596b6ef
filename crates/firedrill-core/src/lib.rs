//! Firedrill Core - the incident workflow engine.
//!
//! This crate provides:
//! - The static scenario catalog (regions, patch versions, checklists, hints)
//! - The per-region workflow state machine and its transition rules
//! - The simulation tick that advances rollouts and rollbacks
//! - Global metrics aggregation and incident phase derivation
//! - Schema-versioned session snapshots
//!
//! Everything here is synchronous and free of I/O. Randomness is injected
//! through [`RandomSource`] so drills can be replayed exactly.
//!
//! # Example
//!
//! ```rust
//! use firedrill_core::prelude::*;
//!
//! let mut rng = SeededRandom::new(7);
//! let mut session = IncidentSession::new(&mut rng, chrono::Utc::now());
//!
//! session.investigate(Region::UsEast).unwrap();
//! assert_eq!(session.region(Region::UsEast).state(), WorkflowState::Investigating);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod catalog;
pub mod clock;
pub mod error;
pub mod event;
pub mod message;
pub mod metrics;
pub mod phase;
pub mod random;
pub mod regions;
pub mod session;
pub mod snapshot;
pub mod view;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{AlertTeam, PATCH_VERSIONS, REGION_COUNT, Region, TOTAL_SERVERS};
pub use clock::SimulationClock;
pub use error::{WorkflowError, WorkflowResult};
pub use event::{Severity, WorkflowEvent};
pub use message::{ActionKind, ActionRecord, ChatMessage, MessageRole, Persona};
pub use metrics::{GlobalMetrics, Trend};
pub use phase::{IncidentPhase, derive_phase};
pub use random::{RandomSource, SeededRandom};
pub use regions::RegionMap;
pub use session::IncidentSession;
pub use snapshot::{SCHEMA_VERSION, SnapshotError, SnapshotResult};
pub use view::{RegionHealth, RegionView, SessionView};
pub use workflow::{Operation, RegionWorkflow, SecurityItem, WorkflowState};
