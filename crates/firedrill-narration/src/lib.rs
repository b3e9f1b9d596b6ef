//! Firedrill Narration - persona chat around the incident workflow.
//!
//! This crate provides:
//! - SRE and Security Auditor system prompts with an in-simulation guardrail
//! - Mapping from workflow events to narration requests
//! - A [`Narrator`] that calls the language model with a bounded timeout
//!   and falls back to deterministic text on any failure
//!
//! Narration never gates a transition: callers commit state first, then
//! narrate.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod brief;
pub mod error;
pub mod narrator;
pub mod persona;
pub mod prompt;

pub use brief::{IncidentBrief, RegionBrief};
pub use error::{NarrationError, NarrationResult};
pub use narrator::{
    DEFAULT_HISTORY_MESSAGES, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT, Narration, NarrationSource,
    Narrator, NarratorConfig,
};
pub use persona::system_prompt;
pub use prompt::{NarrationRequest, chat, chat_fallback, for_event, security_briefing};
