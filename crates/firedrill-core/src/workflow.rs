//! Per-region workflow state machine.
//!
//! ```text
//! idle → investigating → ready_to_patch → patching → patched → security_review → verified
//!                                              ↓
//!                                        patch_failed → rolling_back → ready_to_patch
//! ```
//!
//! A region may also be re-patched from `patched` until security review
//! begins. Fields are private: every change goes through a named transition
//! so the invariants on progress, failure counts and checklists hold.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Region;
use crate::error::{WorkflowError, WorkflowResult};
use crate::event::WorkflowEvent;
use crate::random::RandomSource;

/// Smallest progress gain per tick while patching.
pub const PATCH_STEP_MIN: u32 = 8;
/// Largest progress gain per tick while patching.
pub const PATCH_STEP_MAX: u32 = 15;
/// Smallest progress loss per tick while rolling back.
pub const ROLLBACK_STEP_MIN: u32 = 20;
/// Largest progress loss per tick while rolling back.
pub const ROLLBACK_STEP_MAX: u32 = 30;
/// Failures can only occur strictly above this progress...
pub const FAILURE_WINDOW_LOW: u8 = 30;
/// ...and strictly below this one.
pub const FAILURE_WINDOW_HIGH: u8 = 80;
/// Failure chance for a region that has never failed.
pub const BASE_FAILURE_CHANCE: f64 = 0.15;
/// Chance removed for each prior failure.
pub const FAILURE_CHANCE_DECAY: f64 = 0.05;

/// Error rate every region starts at.
pub const REGION_BASELINE_ERROR_RATE: f64 = 0.3;
/// Lowest error rate a remediated region settles to.
pub const REGION_ERROR_FLOOR: f64 = 0.1;
/// Highest error rate a region can reach.
pub const REGION_ERROR_CEILING: f64 = 10.0;
const FAILURE_ERROR_SPIKE: f64 = 1.5;
const PATCH_SUCCESS_RELIEF: f64 = 1.0;
const WRONG_PATCH_PENALTY: f64 = 0.8;
const UNREMEDIATED_DRIFT: f64 = 0.05;
const REMEDIATED_RECOVERY: f64 = 0.1;

/// Progress value at which a rollout or rollback is complete.
const FULL_PROGRESS: u8 = 100;

/// Discrete stage of incident handling for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Nothing has happened yet.
    Idle,
    /// The SRE team is looking at the region.
    Investigating,
    /// The required patch is known; a rollout can start.
    ReadyToPatch,
    /// A kernel rollout is in progress.
    Patching,
    /// The rollout failed part way.
    PatchFailed,
    /// The previous kernel is being restored.
    RollingBack,
    /// A rollout completed (possibly with the wrong version).
    Patched,
    /// The security checklist is being worked through.
    SecurityReview,
    /// Every checklist item is verified. Terminal.
    Verified,
}

impl WorkflowState {
    /// Wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Investigating => "investigating",
            Self::ReadyToPatch => "ready_to_patch",
            Self::Patching => "patching",
            Self::PatchFailed => "patch_failed",
            Self::RollingBack => "rolling_back",
            Self::Patched => "patched",
            Self::SecurityReview => "security_review",
            Self::Verified => "verified",
        }
    }

    /// A rollout or rollback is underway or stuck mid-way.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Patching | Self::PatchFailed | Self::RollingBack)
    }

    /// The region has completed at least one rollout.
    #[must_use]
    pub const fn is_patched_or_later(self) -> bool {
        matches!(self, Self::Patched | Self::SecurityReview | Self::Verified)
    }

    /// The region has entered the security phase.
    #[must_use]
    pub const fn is_in_review_range(self) -> bool {
        matches!(self, Self::SecurityReview | Self::Verified)
    }

    /// Operator guidance for moving a region on from this state.
    #[must_use]
    pub fn next_step(self, region: Region) -> String {
        match self {
            Self::Idle => format!("run 'alert sre {region}' to investigate first"),
            Self::Investigating => format!("wait for the investigation of {region} to finish"),
            Self::ReadyToPatch => format!("run 'patch {region} <version>' to start the rollout"),
            Self::Patching => format!("wait for the rollout in {region} to finish"),
            Self::PatchFailed => format!("run 'rollback {region}' before patching again"),
            Self::RollingBack => format!("wait for the rollback in {region} to finish"),
            Self::Patched => format!(
                "wait for the security phase, or run 'rollback {region}' to replace the patch"
            ),
            Self::SecurityReview => format!("run 'verify {region}' to work through the checklist"),
            Self::Verified => format!("{region} is fully verified; nothing is left to do there"),
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-initiated operations, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Start an investigation.
    Investigate,
    /// Finish an investigation.
    CompleteInvestigation,
    /// Start a rollout.
    Patch,
    /// Start a rollback.
    Rollback,
    /// Verify a checklist item.
    Verify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Investigate => "investigate",
            Self::CompleteInvestigation => "finish investigating",
            Self::Patch => "patch",
            Self::Rollback => "roll back",
            Self::Verify => "verify",
        })
    }
}

/// One security checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityItem {
    /// What the auditor checks.
    pub description: String,
    /// Canned result revealed on verification.
    pub finding: String,
    /// Whether the item has been verified.
    pub verified: bool,
}

impl SecurityItem {
    pub(crate) fn new(description: String, finding: String) -> Self {
        Self {
            description,
            finding,
            verified: false,
        }
    }
}

/// Result of verifying one checklist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedItem {
    /// The item that was just verified.
    pub item: SecurityItem,
    /// Items still unverified in the region.
    pub remaining: usize,
}

/// Workflow record for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionWorkflow {
    region: Region,
    state: WorkflowState,
    patch_version: Option<String>,
    patch_progress: u8,
    required_patch: String,
    investigation_complete: bool,
    security_items: Vec<SecurityItem>,
    security_verified: bool,
    error_rate: f64,
    failure_count: u32,
}

impl RegionWorkflow {
    pub(crate) fn new(region: Region, required_patch: &str) -> Self {
        Self {
            region,
            state: WorkflowState::Idle,
            patch_version: None,
            patch_progress: 0,
            required_patch: required_patch.to_string(),
            investigation_complete: false,
            security_items: Vec::new(),
            security_verified: false,
            error_rate: REGION_BASELINE_ERROR_RATE,
            failure_count: 0,
        }
    }

    /// The region this record belongs to.
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Version being rolled out or last completed.
    #[must_use]
    pub fn patch_version(&self) -> Option<&str> {
        self.patch_version.as_deref()
    }

    /// Rollout or rollback progress, 0 to 100.
    #[must_use]
    pub fn patch_progress(&self) -> u8 {
        self.patch_progress
    }

    /// The version that actually fixes this region.
    #[must_use]
    pub fn required_patch(&self) -> &str {
        &self.required_patch
    }

    /// Whether an investigation has ever finished.
    #[must_use]
    pub fn investigation_complete(&self) -> bool {
        self.investigation_complete
    }

    /// Security checklist (empty until the security phase).
    #[must_use]
    pub fn security_items(&self) -> &[SecurityItem] {
        &self.security_items
    }

    /// Whether every checklist item has been verified.
    #[must_use]
    pub fn security_verified(&self) -> bool {
        self.security_verified
    }

    /// Region-local error rate (percent).
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Consecutive rollout failures since the last correct completion.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Completed a rollout, but with a version that does not fix the region.
    #[must_use]
    pub fn is_wrong_patch(&self) -> bool {
        self.state.is_patched_or_later()
            && self.patch_version.as_deref() != Some(self.required_patch.as_str())
    }

    /// Completed a rollout with the required version.
    #[must_use]
    pub fn is_remediated(&self) -> bool {
        self.state.is_patched_or_later() && !self.is_wrong_patch()
    }

    fn invalid(&self, operation: Operation) -> WorkflowError {
        WorkflowError::InvalidTransition {
            region: self.region,
            operation,
            state: self.state,
            guidance: self.state.next_step(self.region),
        }
    }

    /// `idle | ready_to_patch → investigating`.
    pub(crate) fn investigate(&mut self) -> WorkflowResult<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::ReadyToPatch => {
                self.state = WorkflowState::Investigating;
                Ok(())
            },
            _ => Err(self.invalid(Operation::Investigate)),
        }
    }

    /// `investigating → ready_to_patch`.
    pub(crate) fn complete_investigation(&mut self) -> WorkflowResult<()> {
        if self.state != WorkflowState::Investigating {
            return Err(self.invalid(Operation::CompleteInvestigation));
        }
        self.state = WorkflowState::ReadyToPatch;
        self.investigation_complete = true;
        Ok(())
    }

    /// `ready_to_patch | patched → patching`.
    pub(crate) fn apply_patch(&mut self, version: &str) -> WorkflowResult<()> {
        let allowed = match self.state {
            WorkflowState::ReadyToPatch => self.investigation_complete,
            WorkflowState::Patched => true,
            _ => false,
        };
        if !allowed {
            return Err(WorkflowError::PreconditionFailed {
                action: format!("patch {}", self.region),
                unmet: vec![format!(
                    "{} is {}: {}",
                    self.region,
                    self.state,
                    self.state.next_step(self.region)
                )],
            });
        }
        self.state = WorkflowState::Patching;
        self.patch_version = Some(version.to_string());
        self.patch_progress = 0;
        Ok(())
    }

    /// `patch_failed | patched → rolling_back`, always from full progress.
    pub(crate) fn rollback(&mut self) -> WorkflowResult<()> {
        match self.state {
            WorkflowState::PatchFailed | WorkflowState::Patched => {
                self.state = WorkflowState::RollingBack;
                self.patch_progress = FULL_PROGRESS;
                Ok(())
            },
            _ => Err(self.invalid(Operation::Rollback)),
        }
    }

    /// `patched → security_review` with a fresh checklist.
    pub(crate) fn enter_security_review(&mut self, items: Vec<SecurityItem>) {
        if self.state == WorkflowState::Patched {
            self.state = WorkflowState::SecurityReview;
            self.security_items = items;
        }
    }

    /// Verify the first unverified item; the last one moves the region to
    /// `verified`.
    pub(crate) fn verify_next_item(&mut self) -> WorkflowResult<VerifiedItem> {
        if self.state != WorkflowState::SecurityReview {
            return Err(WorkflowError::NotInReview {
                region: self.region,
                state: self.state,
                guidance: self.state.next_step(self.region),
            });
        }
        let Some(item) = self.security_items.iter_mut().find(|i| !i.verified) else {
            return Err(WorkflowError::NotInReview {
                region: self.region,
                state: self.state,
                guidance: self.state.next_step(self.region),
            });
        };
        item.verified = true;
        let verified = item.clone();
        let remaining = self.security_items.iter().filter(|i| !i.verified).count();
        if remaining == 0 {
            self.state = WorkflowState::Verified;
            self.security_verified = true;
        }
        Ok(VerifiedItem {
            item: verified,
            remaining,
        })
    }

    /// Failure chance for the next roll, decreasing with prior failures.
    #[must_use]
    pub fn failure_chance(&self) -> f64 {
        let prior = f64::from(self.failure_count);
        (BASE_FAILURE_CHANCE - FAILURE_CHANCE_DECAY * prior).max(0.0)
    }

    /// One tick of rollout, rollback and error-rate drift.
    pub(crate) fn advance(&mut self, rng: &mut dyn RandomSource) -> Option<WorkflowEvent> {
        let event = match self.state {
            WorkflowState::Patching => self.advance_rollout(rng),
            WorkflowState::RollingBack => self.advance_rollback(rng),
            _ => None,
        };
        self.drift();
        event
    }

    fn advance_rollout(&mut self, rng: &mut dyn RandomSource) -> Option<WorkflowEvent> {
        let step = rng.between(PATCH_STEP_MIN, PATCH_STEP_MAX);
        let progress = u32::from(self.patch_progress)
            .saturating_add(step)
            .min(u32::from(FULL_PROGRESS));
        self.patch_progress = u8::try_from(progress).unwrap_or(FULL_PROGRESS);

        let in_window = self.patch_progress > FAILURE_WINDOW_LOW
            && self.patch_progress < FAILURE_WINDOW_HIGH;
        if in_window && rng.chance(self.failure_chance()) {
            self.state = WorkflowState::PatchFailed;
            self.failure_count = self.failure_count.saturating_add(1);
            self.error_rate = (self.error_rate + FAILURE_ERROR_SPIKE).min(REGION_ERROR_CEILING);
            return Some(WorkflowEvent::PatchFailed {
                region: self.region,
                progress: self.patch_progress,
                failure_count: self.failure_count,
            });
        }

        if self.patch_progress < FULL_PROGRESS {
            return None;
        }

        self.state = WorkflowState::Patched;
        let version = self.patch_version.clone().unwrap_or_default();
        if version == self.required_patch {
            self.failure_count = 0;
            self.error_rate = (self.error_rate - PATCH_SUCCESS_RELIEF).max(REGION_ERROR_FLOOR);
            Some(WorkflowEvent::PatchSucceeded {
                region: self.region,
                version,
            })
        } else {
            self.error_rate = (self.error_rate + WRONG_PATCH_PENALTY).min(REGION_ERROR_CEILING);
            Some(WorkflowEvent::WrongPatchCompleted {
                region: self.region,
                version,
            })
        }
    }

    fn advance_rollback(&mut self, rng: &mut dyn RandomSource) -> Option<WorkflowEvent> {
        let step = rng.between(ROLLBACK_STEP_MIN, ROLLBACK_STEP_MAX);
        let remaining = u32::from(self.patch_progress).saturating_sub(step);
        if remaining == 0 {
            self.state = WorkflowState::ReadyToPatch;
            self.patch_version = None;
            self.patch_progress = 0;
            return Some(WorkflowEvent::RollbackCompleted {
                region: self.region,
            });
        }
        self.patch_progress = u8::try_from(remaining).unwrap_or(FULL_PROGRESS);
        None
    }

    fn drift(&mut self) {
        self.error_rate = if self.is_remediated() {
            (self.error_rate - REMEDIATED_RECOVERY).max(REGION_ERROR_FLOOR)
        } else {
            (self.error_rate + UNREMEDIATED_DRIFT).min(REGION_ERROR_CEILING)
        };
    }

    /// Structural checks applied to records loaded from storage.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.patch_progress > FULL_PROGRESS {
            return Err(format!(
                "{} has patch progress {} above 100",
                self.region, self.patch_progress
            ));
        }
        if self.state.is_in_review_range() && self.security_items.is_empty() {
            return Err(format!("{} is {} without a checklist", self.region, self.state));
        }
        if !self.error_rate.is_finite() {
            return Err(format!("{} has a non-finite error rate", self.region));
        }
        Ok(())
    }
}
