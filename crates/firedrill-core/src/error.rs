//! Workflow error types.
//!
//! Every variant is a local validation failure. The façade turns them into a
//! rejected command result; none of them aborts the session.

use thiserror::Error;

use crate::catalog::{PATCH_VERSIONS, Region};
use crate::workflow::{Operation, WorkflowState};

/// Why a workflow operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The operation is not legal from the region's current state.
    #[error("cannot {operation} {region} while it is {state}: {guidance}")]
    InvalidTransition {
        /// Target region.
        region: Region,
        /// Attempted operation.
        operation: Operation,
        /// State the region was in.
        state: WorkflowState,
        /// What would make the operation legal.
        guidance: String,
    },

    /// Region identifier outside the scenario catalog.
    #[error("unknown region '{0}'. Available regions: {regions}", regions = Region::names())]
    UnknownRegion(String),

    /// Patch version outside the scenario catalog.
    #[error("unknown patch version '{0}'. Available versions: {versions}", versions = PATCH_VERSIONS.join(", "))]
    UnknownVersion(String),

    /// Checklist verification attempted outside security review.
    #[error("{region} is not under security review (it is {state}): {guidance}")]
    NotInReview {
        /// Target region.
        region: Region,
        /// State the region was in.
        state: WorkflowState,
        /// What would make verification legal.
        guidance: String,
    },

    /// One or more preconditions of the action are unmet.
    #[error("cannot {action}: {}", .unmet.join("; "))]
    PreconditionFailed {
        /// The attempted action, as the operator would phrase it.
        action: String,
        /// Each unmet precondition.
        unmet: Vec<String>,
    },
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
