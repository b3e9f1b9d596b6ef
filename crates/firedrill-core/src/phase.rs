//! Incident phase derivation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::regions::RegionMap;
use crate::workflow::WorkflowState;

/// Operator actions after which an untouched incident counts as under
/// investigation.
pub const INVESTIGATION_ACTION_THRESHOLD: usize = 3;

/// Overall incident phase, rolled up from the region workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentPhase {
    /// Nothing has been looked at yet.
    Triage,
    /// Regions are being investigated or audited.
    Investigation,
    /// Rollouts or rollbacks are underway.
    Response,
    /// The incident is closed.
    Resolved,
}

impl IncidentPhase {
    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Investigation => "investigation",
            Self::Response => "response",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session flags the phase depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseInputs {
    /// The SRE confirmed closure (first `resolve`).
    pub sre_confirmed: bool,
    /// The operator asked to close after confirmation (second `resolve`).
    pub closure_requested: bool,
    /// Operator actions logged so far.
    pub action_count: usize,
}

/// Derive the phase from scratch. Evaluated every tick; never stored as a
/// transition.
#[must_use]
pub fn derive_phase(regions: &RegionMap, inputs: PhaseInputs) -> IncidentPhase {
    let all_verified = regions.all(|w| w.state() == WorkflowState::Verified);
    if all_verified && inputs.sre_confirmed && inputs.closure_requested {
        return IncidentPhase::Resolved;
    }
    if regions.any(|w| w.state().is_in_review_range()) {
        return IncidentPhase::Investigation;
    }
    if regions.any(|w| w.state().is_in_flight()) {
        return IncidentPhase::Response;
    }
    let investigating = regions.any(|w| {
        matches!(
            w.state(),
            WorkflowState::Investigating | WorkflowState::ReadyToPatch
        )
    });
    if investigating || inputs.action_count > INVESTIGATION_ACTION_THRESHOLD {
        return IncidentPhase::Investigation;
    }
    IncidentPhase::Triage
}
