//! Session fixtures.
//!
//! Helpers that walk regions through the workflow with a calm random source
//! so tests can start from an interesting state.

use chrono::{TimeDelta, Utc};
use firedrill_core::{IncidentSession, RandomSource, Region, WorkflowState};

use crate::random::calm_random;

/// Ticks allowed for a rollout or rollback to finish before a fixture gives
/// up.
const MAX_SETTLE_TICKS: u32 = 64;

/// Simulated time per fixture tick.
fn step() -> TimeDelta {
    TimeDelta::seconds(50)
}

/// A fresh session built with [`calm_random`].
#[must_use]
pub fn fresh_session() -> IncidentSession {
    IncidentSession::new(&mut calm_random(), Utc::now())
}

/// Investigate a region and complete the investigation.
///
/// # Panics
///
/// Panics if the region cannot be investigated from its current state.
pub fn investigated(session: &mut IncidentSession, region: Region) {
    session.investigate(region).expect("investigate");
    session
        .complete_investigation(region)
        .expect("complete investigation");
}

/// Start a rollout of `version` and tick until it leaves `patching`.
///
/// Returns the state the region settled in.
///
/// # Panics
///
/// Panics if the patch is rejected or never settles.
pub fn patch_to_completion(
    session: &mut IncidentSession,
    rng: &mut dyn RandomSource,
    region: Region,
    version: &str,
) -> WorkflowState {
    session.apply_patch(region, version).expect("apply patch");
    for _ in 0..MAX_SETTLE_TICKS {
        session.tick(rng, step(), Utc::now());
        let state = session.region(region).state();
        if state != WorkflowState::Patching {
            return state;
        }
    }
    panic!("rollout in {region} did not settle");
}

/// Investigate and correctly patch every region. The final rollout opens the
/// security phase.
///
/// # Panics
///
/// Panics if any region is not `idle` or if a rollout fails.
pub fn drive_to_security_review(session: &mut IncidentSession) {
    let mut rng = calm_random();
    for region in Region::ALL {
        investigated(session, region);
        let required = session.region(region).required_patch().to_string();
        patch_to_completion(session, &mut rng, region, &required);
    }
    assert!(
        session.security_phase_active(),
        "security phase did not open"
    );
}

/// Verify every checklist item of every region.
///
/// # Panics
///
/// Panics if a region is not in security review.
pub fn verify_all(session: &mut IncidentSession) {
    for region in Region::ALL {
        while session.region(region).state() == WorkflowState::SecurityReview {
            session.verify_next_item(region).expect("verify");
        }
    }
}
