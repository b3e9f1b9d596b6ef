//! Owned summary of a session for prompt building.
//!
//! Taken while the session lock is held, then used after it is released so
//! no generation call ever borrows live state.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use firedrill_core::catalog::{CVE, INITIAL_AFFECTED_SERVERS, SEVERITY};
use firedrill_core::{IncidentPhase, IncidentSession, Persona, Region, WorkflowState};

/// One region, as the narrator sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBrief {
    /// Region id.
    pub region: Region,
    /// Workflow state.
    pub state: WorkflowState,
    /// Rollout or rollback progress.
    pub progress: u8,
    /// Required patch, only once investigated.
    pub known_patch: Option<String>,
    /// Consecutive rollout failures.
    pub failure_count: u32,
    /// Region error rate (percent).
    pub error_rate: f64,
    /// Checklist items not yet verified.
    pub outstanding_items: Vec<String>,
}

/// Everything a prompt may mention about the live incident.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentBrief {
    /// Current phase.
    pub phase: IncidentPhase,
    /// Narrating persona.
    pub persona: Persona,
    /// Simulated clock.
    pub sim_time: DateTime<Utc>,
    /// Global error rate (percent).
    pub error_rate: f64,
    /// Global P99 latency (ms).
    pub latency_p99: f64,
    /// Servers still exposed.
    pub affected_servers: u32,
    /// Regions in catalog order.
    pub regions: Vec<RegionBrief>,
}

impl From<&IncidentSession> for IncidentBrief {
    fn from(session: &IncidentSession) -> Self {
        let regions = session
            .regions()
            .iter()
            .map(|w| RegionBrief {
                region: w.region(),
                state: w.state(),
                progress: w.patch_progress(),
                known_patch: w
                    .investigation_complete()
                    .then(|| w.required_patch().to_string()),
                failure_count: w.failure_count(),
                error_rate: w.error_rate(),
                outstanding_items: w
                    .security_items()
                    .iter()
                    .filter(|i| !i.verified)
                    .map(|i| i.description.clone())
                    .collect(),
            })
            .collect();
        Self {
            phase: session.phase(),
            persona: session.ai_persona(),
            sim_time: session.sim_time(),
            error_rate: session.metrics().error_rate,
            latency_p99: session.metrics().latency_p99,
            affected_servers: INITIAL_AFFECTED_SERVERS.saturating_sub(session.patched_servers()),
            regions,
        }
    }
}

impl IncidentBrief {
    /// Region lookup.
    #[must_use]
    pub fn region(&self, region: Region) -> Option<&RegionBrief> {
        self.regions.iter().find(|r| r.region == region)
    }

    /// Regions with unverified checklist items.
    pub fn outstanding(&self) -> impl Iterator<Item = &RegionBrief> {
        self.regions
            .iter()
            .filter(|r| !r.outstanding_items.is_empty())
    }

    /// Status block embedded in system prompts.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "- Incident: {} ({SEVERITY})", CVE.id);
        let _ = writeln!(out, "- Phase: {}", self.phase);
        let _ = writeln!(out, "- Affected Servers: {}", self.affected_servers);
        let _ = writeln!(out, "- Error Rate: {:.2}%", self.error_rate);
        let _ = writeln!(out, "- P99 Latency: {:.0}ms", self.latency_p99);
        let _ = writeln!(
            out,
            "- Simulated Time: {}",
            self.sim_time.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out.push_str("- Regions:\n");
        for r in &self.regions {
            let _ = write!(out, "  - {}: {}", r.region, r.state);
            if r.state.is_in_flight() {
                let _ = write!(out, " ({}%)", r.progress);
            }
            if let Some(patch) = &r.known_patch {
                let _ = write!(out, ", needs {patch}");
            }
            if r.failure_count > 0 {
                let _ = write!(out, ", {} failed rollout(s)", r.failure_count);
            }
            if !r.outstanding_items.is_empty() {
                let _ = write!(out, ", {} checklist item(s) open", r.outstanding_items.len());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedrill_test::{drive_to_security_review, fresh_session, investigated};

    #[test]
    fn hides_patch_until_investigated() {
        let mut session = fresh_session();
        session.investigate(Region::EuWest).unwrap();
        let brief = IncidentBrief::from(&session);
        assert!(brief.region(Region::EuWest).unwrap().known_patch.is_none());

        session.complete_investigation(Region::EuWest).unwrap();
        let brief = IncidentBrief::from(&session);
        let expected = session.region(Region::EuWest).required_patch();
        assert_eq!(
            brief.region(Region::EuWest).unwrap().known_patch.as_deref(),
            Some(expected)
        );
        assert!(brief.render().contains(&format!("eu-west: ready_to_patch, needs {expected}")));
    }

    #[test]
    fn render_mentions_incident() {
        let mut session = fresh_session();
        investigated(&mut session, Region::Apac);
        let text = IncidentBrief::from(&session).render();
        assert!(text.contains("CVE-2024-8765 (P0)"));
        assert!(text.contains("- Phase: investigation"));
        assert!(text.contains("us-east: idle"));
    }

    #[test]
    fn lists_outstanding_checklists() {
        let mut session = fresh_session();
        drive_to_security_review(&mut session);
        let brief = IncidentBrief::from(&session);
        assert_eq!(brief.outstanding().count(), 5);
        assert_eq!(brief.persona, Persona::Security);
        assert!(brief.render().contains("3 checklist item(s) open"));
    }
}
