//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_gateway::prelude::*;` to import all essential types.

// Errors
pub use crate::{GatewayError, GatewayResult};

// Server
pub use crate::GatewayServer;

// RPC
pub use crate::{IncidentRpcClient, IncidentRpcServer};
