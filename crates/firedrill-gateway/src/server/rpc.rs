//! RPC method implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use firedrill_core::SessionView;
use firedrill_runtime::{CommandResult, IncidentRuntime};
use jsonrpsee::PendingSubscriptionSink;
use jsonrpsee::types::ErrorObjectOwned;
use tracing::{debug, error};

use crate::rpc::{
    IncidentRpcServer, MAX_INPUT_LEN, internal_error, invalid_request, shutting_down,
};

/// The jsonrpsee RPC method handler.
pub(super) struct RpcImpl {
    pub(super) runtime: IncidentRuntime,
    pub(super) closing: Arc<AtomicBool>,
}

impl RpcImpl {
    fn ensure_open(&self) -> Result<(), ErrorObjectOwned> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(shutting_down());
        }
        Ok(())
    }
}

fn check_len(what: &str, len: usize) -> Result<(), ErrorObjectOwned> {
    if len > MAX_INPUT_LEN {
        return Err(invalid_request(format!(
            "{what} is {len} bytes; the limit is {MAX_INPUT_LEN}"
        )));
    }
    Ok(())
}

#[jsonrpsee::core::async_trait]
impl IncidentRpcServer for RpcImpl {
    async fn execute_command(
        &self,
        command: String,
        args: Vec<String>,
    ) -> Result<CommandResult, ErrorObjectOwned> {
        self.ensure_open()?;
        if command.trim().is_empty() {
            return Err(invalid_request("command must not be empty"));
        }
        check_len(
            "command line",
            args.iter().map(String::len).fold(command.len(), usize::saturating_add),
        )?;
        debug!(%command, args = args.len(), "executeCommand");

        // Panics surface as INTERNAL_ERROR.
        let runtime = self.runtime.clone();
        tokio::spawn(async move { runtime.execute(&command, &args).await })
            .await
            .map_err(|e| {
                error!(error = %e, "command handler failed");
                internal_error("command handler failed")
            })
    }

    async fn send_message(&self, content: String) -> Result<(), ErrorObjectOwned> {
        self.ensure_open()?;
        if content.trim().is_empty() {
            return Err(invalid_request("message must not be empty"));
        }
        check_len("message", content.len())?;
        self.runtime.send_message(&content).await;
        Ok(())
    }

    async fn get_state(&self) -> Result<SessionView, ErrorObjectOwned> {
        Ok(self.runtime.state().await)
    }

    async fn reset(&self) -> Result<(), ErrorObjectOwned> {
        self.ensure_open()?;
        self.runtime.reset().await;
        Ok(())
    }

    async fn subscribe_events(
        &self,
        pending: PendingSubscriptionSink,
    ) -> jsonrpsee::core::SubscriptionResult {
        self.subscribe_events_impl(pending).await
    }
}
