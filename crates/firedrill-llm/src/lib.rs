//! Firedrill LLM - text generation capability behind the persona chat.
//!
//! This crate provides:
//! - The [`LlmProvider`] trait narration depends on
//! - Cloudflare Workers AI and `OpenAI`-compatible HTTP providers
//! - A disabled provider for offline drills
//!
//! Every failure is classified by [`LlmError::is_unavailable`] so callers can
//! tell "no backend" apart from "this request failed".

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod http;
mod openai_compat;
mod provider;
mod types;
mod workers_ai;

pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{DisabledProvider, LlmProvider, ProviderConfig, ProviderKind, create_provider};
pub use types::{LlmResponse, Message, MessageRole, Usage};
pub use workers_ai::{DEFAULT_MODEL, WorkersAiProvider};
