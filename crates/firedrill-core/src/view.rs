//! Client-facing projection of a session.
//!
//! Clients never see a region's required patch before its investigation has
//! completed; everything else is a straight copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{INITIAL_AFFECTED_SERVERS, Region, TOTAL_SERVERS};
use crate::message::{ChatMessage, Persona};
use crate::metrics::GlobalMetrics;
use crate::phase::IncidentPhase;
use crate::session::IncidentSession;
use crate::workflow::{RegionWorkflow, SecurityItem, WorkflowState};

const DEGRADED_ERROR_RATE: f64 = 2.0;

/// Coarse health of one region, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionHealth {
    /// Nothing alarming.
    Healthy,
    /// Region error rate above 2 %.
    Degraded,
    /// The last rollout failed.
    Critical,
}

impl RegionHealth {
    /// Health of one region.
    #[must_use]
    pub fn of(workflow: &RegionWorkflow) -> Self {
        if workflow.state() == WorkflowState::PatchFailed {
            Self::Critical
        } else if workflow.error_rate() > DEGRADED_ERROR_RATE {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

/// One region as a client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    /// Region id.
    pub region: Region,
    /// Servers in the region.
    pub servers: u32,
    /// Workflow state.
    pub state: WorkflowState,
    /// Display health.
    pub health: RegionHealth,
    /// Version applied or being applied.
    pub patch_version: Option<String>,
    /// Rollout or rollback progress.
    pub patch_progress: u8,
    /// Version that fixes the region, once investigated.
    pub required_patch: Option<String>,
    /// Whether the investigation has completed.
    pub investigation_complete: bool,
    /// Region error rate (percent).
    pub error_rate: f64,
    /// Consecutive rollout failures.
    pub failure_count: u32,
    /// Security checklist.
    pub security_items: Vec<SecurityItem>,
    /// Whether the checklist is fully verified.
    pub security_verified: bool,
}

impl From<&RegionWorkflow> for RegionView {
    fn from(w: &RegionWorkflow) -> Self {
        Self {
            region: w.region(),
            servers: w.region().servers(),
            state: w.state(),
            health: RegionHealth::of(w),
            patch_version: w.patch_version().map(str::to_string),
            patch_progress: w.patch_progress(),
            required_patch: w
                .investigation_complete()
                .then(|| w.required_patch().to_string()),
            investigation_complete: w.investigation_complete(),
            error_rate: w.error_rate(),
            failure_count: w.failure_count(),
            security_items: w.security_items().to_vec(),
            security_verified: w.security_verified(),
        }
    }
}

/// Full session state as broadcast in `state_update` events and returned by
/// `getState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Incident id.
    pub id: Uuid,
    /// Current phase.
    pub phase: IncidentPhase,
    /// Narrating persona.
    pub ai_persona: Persona,
    /// Simulated clock.
    pub sim_time: DateTime<Utc>,
    /// Wall-clock start.
    pub real_start_time: DateTime<Utc>,
    /// Global metrics.
    pub metrics: GlobalMetrics,
    /// Health score from 0 to 100.
    pub health_score: u8,
    /// Servers still exposed.
    pub affected_servers: u32,
    /// Servers running the required patch.
    pub patched_servers: u32,
    /// Servers in the fleet.
    pub total_servers: u32,
    /// Regions in catalog order.
    pub regions: Vec<RegionView>,
    /// Whether the security phase has started.
    pub security_phase_active: bool,
    /// Whether the SRE confirmed closure.
    pub sre_confirmed: bool,
    /// Whether the incident is closed.
    pub resolved: bool,
    /// Seconds to resolution.
    pub resolution_secs: Option<i64>,
    /// Hints handed out.
    pub hints_used: u32,
    /// Commands run.
    pub action_count: usize,
    /// Chat transcript.
    pub messages: Vec<ChatMessage>,
}

impl From<&IncidentSession> for SessionView {
    fn from(s: &IncidentSession) -> Self {
        let patched_servers = s.patched_servers();
        Self {
            id: s.id(),
            phase: s.phase(),
            ai_persona: s.ai_persona(),
            sim_time: s.sim_time(),
            real_start_time: s.real_start_time(),
            metrics: *s.metrics(),
            health_score: s.metrics().health_score(s.remediated_count()),
            affected_servers: INITIAL_AFFECTED_SERVERS.saturating_sub(patched_servers),
            patched_servers,
            total_servers: TOTAL_SERVERS,
            regions: s.regions().iter().map(RegionView::from).collect(),
            security_phase_active: s.security_phase_active(),
            sre_confirmed: s.sre_confirmed(),
            resolved: s.resolved(),
            resolution_secs: s.resolution_secs(),
            hints_used: s.hints_used(),
            action_count: s.actions().len(),
            messages: s.messages().to_vec(),
        }
    }
}
