//! Firedrill Runtime - the live incident behind every client.
//!
//! This crate provides:
//! - [`IncidentRuntime`], which serializes commands, chat and clock ticks
//!   on the one session and broadcasts every committed change
//! - Operator command parsing and the read-only reports (`status`,
//!   `metrics`, `logs`, `regions`, `help`)
//! - Session snapshots on disk
//! - The bridge from `firedrill-config` to runtime, provider and narrator
//!   settings
//!
//! A transition is committed and broadcast before its narration is
//! requested. Narration that arrives after a reset is dropped.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod command;
mod error;
mod report;
mod runtime;
mod store;

pub use command::{
    Command, CommandError, CommandResult, DEFAULT_LOG_WINDOW_MINUTES, audit_line, split_line,
};
pub use config_bridge::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::IncidentRuntime;
pub use store::{SESSION_FILE, SessionStore};

/// Read-only command output, usable without a runtime.
pub mod reports {
    pub use crate::report::{help, logs, metrics, regions, status};
}
