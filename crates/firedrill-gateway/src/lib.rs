//! Firedrill Gateway - JSON-RPC 2.0 over WebSocket in front of the
//! incident runtime.
//!
//! This crate provides:
//! - The `incident` RPC namespace ([`rpc::IncidentRpcServer`] and the
//!   generated [`rpc::IncidentRpcClient`])
//! - [`GatewayServer`], which binds the socket and serves one
//!   [`firedrill_runtime::IncidentRuntime`]
//! - The event subscription that streams every `SimEvent` to observers and
//!   drives the simulation clock
//!
//! # Architecture
//!
//! ```text
//! firedrill-gateway (transport)
//! ├── executeCommand / sendMessage / getState / reset
//! ├── subscribeEvents → event
//! └── firedrill-runtime (session façade)
//!     ├── firedrill-narration
//!     └── firedrill-core
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod rpc;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use rpc::{IncidentRpcClient, IncidentRpcServer, error_codes};
pub use server::GatewayServer;
