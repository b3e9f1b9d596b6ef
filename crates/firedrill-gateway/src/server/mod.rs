//! Gateway `WebSocket` server.
//!
//! Serves the [`IncidentRpc`](crate::rpc::IncidentRpcServer) API for one
//! [`IncidentRuntime`]. The runtime serializes every transition itself, so
//! the RPC handlers hold no locks of their own.

mod events;
mod rpc;
#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use firedrill_config::GatewaySection;
use firedrill_runtime::IncidentRuntime;
use jsonrpsee::server::{Server, ServerHandle};
use tracing::info;

use crate::error::{GatewayError, GatewayResult};
use crate::rpc::IncidentRpcServer;

use self::rpc::RpcImpl;

/// A running gateway.
pub struct GatewayServer {
    handle: ServerHandle,
    addr: SocketAddr,
    runtime: IncidentRuntime,
    closing: Arc<AtomicBool>,
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("addr", &self.addr)
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

impl GatewayServer {
    /// Bind `bind:port` and start serving.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Bind`] if the address cannot be bound.
    pub async fn start(runtime: IncidentRuntime, section: &GatewaySection) -> GatewayResult<Self> {
        let requested = section.address();
        let server = Server::builder()
            .max_connections(section.max_connections)
            .build(requested.as_str())
            .await
            .map_err(|e| GatewayError::Bind {
                addr: requested.clone(),
                message: e.to_string(),
            })?;
        let addr = server.local_addr()?;

        let closing = Arc::new(AtomicBool::new(false));
        let rpc_impl = RpcImpl {
            runtime: runtime.clone(),
            closing: Arc::clone(&closing),
        };
        let handle = server.start(rpc_impl.into_rpc());

        info!(addr = %addr, max_connections = section.max_connections, "gateway listening");
        Ok(Self {
            handle,
            addr,
            runtime,
            closing,
        })
    }

    /// Bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `ws://` URL clients connect to.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// The served runtime.
    #[must_use]
    pub fn runtime(&self) -> &IncidentRuntime {
        &self.runtime
    }

    /// Refuse new calls, close connections, then shut the runtime down.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyStopped`] if the server was stopped
    /// elsewhere.
    pub async fn stop(self) -> GatewayResult<()> {
        self.closing.store(true, Ordering::SeqCst);
        self.handle
            .stop()
            .map_err(|_already| GatewayError::AlreadyStopped)?;
        self.handle.stopped().await;
        self.runtime.shutdown().await;
        info!(addr = %self.addr, "gateway stopped");
        Ok(())
    }
}
