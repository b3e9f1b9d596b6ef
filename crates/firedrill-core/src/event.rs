//! Domain events emitted by workflow transitions and ticks.

use serde::{Deserialize, Serialize};

use crate::catalog::Region;

/// Notification severity shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral progress.
    Info,
    /// A milestone was reached.
    Success,
    /// Something needs attention.
    Warning,
    /// Something went wrong.
    Error,
}

/// Something that happened to the incident.
///
/// The narration layer turns these into persona chat; the façade turns the
/// milestone ones into notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A region entered `investigating`. Carries the ground truth the
    /// investigation narration reveals.
    InvestigationStarted {
        /// Target region.
        region: Region,
        /// The version that fixes the region.
        required_patch: String,
    },
    /// A region reached `ready_to_patch` after investigation.
    InvestigationCompleted {
        /// Target region.
        region: Region,
    },
    /// A rollout started.
    PatchStarted {
        /// Target region.
        region: Region,
        /// Version being rolled out.
        version: String,
    },
    /// A rollout failed inside the failure window.
    PatchFailed {
        /// Target region.
        region: Region,
        /// Progress at the moment of failure.
        progress: u8,
        /// Consecutive failures including this one.
        failure_count: u32,
    },
    /// A rollout of the required version completed.
    PatchSucceeded {
        /// Target region.
        region: Region,
        /// Version rolled out.
        version: String,
    },
    /// A rollout of some other version completed.
    WrongPatchCompleted {
        /// Target region.
        region: Region,
        /// Version rolled out.
        version: String,
    },
    /// A rollback started.
    RollbackStarted {
        /// Target region.
        region: Region,
    },
    /// A rollback finished; the region is ready to patch again.
    RollbackCompleted {
        /// Target region.
        region: Region,
    },
    /// Every region finished a rollout and the checklists are ready.
    SecurityPhaseStarted {
        /// Regions that entered security review.
        regions: Vec<Region>,
    },
    /// One checklist item was verified.
    ItemVerified {
        /// Target region.
        region: Region,
        /// Item description.
        description: String,
        /// The item's finding.
        finding: String,
        /// Items still unverified in the region.
        remaining: usize,
    },
    /// The last checklist item of a region was verified.
    RegionVerified {
        /// Target region.
        region: Region,
    },
    /// Every region is verified; narration returns to the SRE.
    AllVerified,
    /// First `resolve`: the SRE is asked to confirm closure.
    SreConfirmationRequested,
    /// The incident is closed.
    IncidentResolved {
        /// Wall-clock seconds from incident start to resolution.
        resolution_secs: i64,
    },
}

impl WorkflowEvent {
    /// Region the event concerns, if any.
    #[must_use]
    pub fn region(&self) -> Option<Region> {
        match self {
            Self::InvestigationStarted { region, .. }
            | Self::InvestigationCompleted { region }
            | Self::PatchStarted { region, .. }
            | Self::PatchFailed { region, .. }
            | Self::PatchSucceeded { region, .. }
            | Self::WrongPatchCompleted { region, .. }
            | Self::RollbackStarted { region }
            | Self::RollbackCompleted { region }
            | Self::ItemVerified { region, .. }
            | Self::RegionVerified { region } => Some(*region),
            Self::SecurityPhaseStarted { .. }
            | Self::AllVerified
            | Self::SreConfirmationRequested
            | Self::IncidentResolved { .. } => None,
        }
    }

    /// Milestone notification for the event.
    ///
    /// A wrong-version completion deliberately has none: the operator has to
    /// spot it in the metrics.
    #[must_use]
    pub fn notification(&self) -> Option<(Severity, String)> {
        match self {
            Self::PatchFailed {
                region, progress, ..
            } => Some((
                Severity::Error,
                format!("Patch rollout failed in {region} at {progress}%"),
            )),
            Self::PatchSucceeded { region, version } => Some((
                Severity::Success,
                format!("Patch {version} rolled out across {region}"),
            )),
            Self::RollbackCompleted { region } => Some((
                Severity::Info,
                format!("Rollback complete in {region}; ready to patch"),
            )),
            Self::SecurityPhaseStarted { .. } => Some((
                Severity::Info,
                "All regions patched. Security review has begun".to_string(),
            )),
            Self::RegionVerified { region } => Some((
                Severity::Success,
                format!("{region} passed security verification"),
            )),
            Self::AllVerified => Some((
                Severity::Success,
                "Every region is verified. Run 'resolve' to close the incident".to_string(),
            )),
            Self::IncidentResolved { resolution_secs } => Some((
                Severity::Success,
                format!("Incident resolved in {}", format_duration(*resolution_secs)),
            )),
            _ => None,
        }
    }
}

/// `1h 02m 03s` style duration.
#[must_use]
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}
