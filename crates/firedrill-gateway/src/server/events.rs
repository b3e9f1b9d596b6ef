//! Event subscription.

use firedrill_events::SimEvent;
use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage, SubscriptionSink};
use tracing::{debug, trace, warn};

use super::rpc::RpcImpl;

impl RpcImpl {
    pub(super) async fn subscribe_events_impl(
        &self,
        pending: PendingSubscriptionSink,
    ) -> jsonrpsee::core::SubscriptionResult {
        if self.closing.load(std::sync::atomic::Ordering::SeqCst) {
            pending.reject(crate::rpc::shutting_down()).await;
            return Ok(());
        }

        // Subscribe before taking the snapshot.
        let mut events = self.runtime.subscribe();
        let sink = pending.accept().await?;

        let greeting = [
            SimEvent::system(self.runtime.welcome_banner()),
            SimEvent::state(self.runtime.state().await),
        ];
        for event in &greeting {
            if !send(&sink, event).await {
                return Ok(());
            }
        }

        let runtime = self.runtime.clone();
        runtime.observer_attached().await;
        debug!(subscription = ?sink.subscription_id(), "observer subscribed");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = sink.closed() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            trace!(event_type = event.event_type(), "forwarding event");
                            if !send(&sink, &event).await {
                                break;
                            }
                        },
                        None => break,
                    },
                }
            }
            runtime.observer_detached().await;
            debug!("observer unsubscribed");
        });

        Ok(())
    }
}

/// Send one event. `false` once the client is gone.
async fn send(sink: &SubscriptionSink, event: &SimEvent) -> bool {
    match SubscriptionMessage::from_json(event) {
        Ok(msg) => sink.send(msg).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "failed to serialize event");
            true
        },
    }
}
