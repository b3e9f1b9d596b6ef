//! JSON-RPC API definition.
//!
//! The gateway implements the server side; `firedrill play` and the
//! integration tests use the generated client.

use firedrill_core::SessionView;
use firedrill_events::SimEvent;
use firedrill_runtime::CommandResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;

/// Longest chat message or command line accepted, in bytes.
pub const MAX_INPUT_LEN: usize = 4096;

/// The `incident` namespace.
#[rpc(server, client, namespace = "incident")]
pub trait IncidentRpc {
    /// Run an operator command. Rejections are a `CommandResult` with
    /// `success: false`, not an RPC error.
    #[method(name = "executeCommand")]
    async fn execute_command(
        &self,
        command: String,
        args: Vec<String>,
    ) -> Result<CommandResult, ErrorObjectOwned>;

    /// Chat with the narrating persona. The reply streams as a `message`
    /// event.
    #[method(name = "sendMessage")]
    async fn send_message(&self, content: String) -> Result<(), ErrorObjectOwned>;

    /// Current session view.
    #[method(name = "getState")]
    async fn get_state(&self) -> Result<SessionView, ErrorObjectOwned>;

    /// Discard the incident and start a fresh one.
    #[method(name = "reset")]
    async fn reset(&self) -> Result<(), ErrorObjectOwned>;

    /// Stream `SimEvent`s. The first two are a `system` welcome banner and a
    /// `state_update`.
    #[subscription(name = "subscribeEvents" => "event", unsubscribe = "unsubscribeEvents", item = SimEvent)]
    async fn subscribe_events(&self) -> jsonrpsee::core::SubscriptionResult;
}

/// Error codes for RPC responses.
pub mod error_codes {
    /// Gateway is shutting down.
    pub const SHUTTING_DOWN: i32 = -32003;
    /// Internal gateway error.
    pub const INTERNAL_ERROR: i32 = -32004;
    /// Invalid request (bad parameters, etc.).
    pub const INVALID_REQUEST: i32 = -32005;
}

pub(crate) fn invalid_request(message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(error_codes::INVALID_REQUEST, message.into(), None::<()>)
}

pub(crate) fn internal_error(message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(error_codes::INTERNAL_ERROR, message.into(), None::<()>)
}

pub(crate) fn shutting_down() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        error_codes::SHUTTING_DOWN,
        "gateway is shutting down",
        None::<()>,
    )
}
