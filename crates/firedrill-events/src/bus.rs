//! Event bus for broadcasting events to observers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::event::SimEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcasts [`SimEvent`]s to every subscribed observer.
///
/// Clones share the same channel. A slow receiver loses the oldest events
/// rather than blocking publishers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<SimEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, capacity }
    }

    /// Publish an event. Returns the number of receivers it reached.
    pub fn publish(&self, event: SimEvent) -> usize {
        let event_type = event.event_type();
        match self.sender.send(Arc::new(event)) {
            Ok(count) => {
                trace!(event_type, receiver_count = count, "event published");
                count
            },
            Err(_) => {
                trace!(event_type, "no receivers for event");
                0
            },
        }
    }

    /// Subscribe to all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<SimEvent>>,
}

impl EventReceiver {
    /// Receive the next event, skipping over any that were dropped because
    /// this receiver fell behind. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Arc<SimEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive an event if one is queued.
    pub fn try_recv(&mut self) -> Option<Arc<SimEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}
