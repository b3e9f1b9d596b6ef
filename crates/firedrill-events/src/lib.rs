//! Firedrill Events - broadcast of simulation output to observers.
//!
//! Every connected client holds an [`EventReceiver`]. The runtime publishes
//! state snapshots, persona chat, milestone notifications and banners as
//! [`SimEvent`]s; the gateway forwards them over its subscription.
//!
//! # Example
//!
//! ```rust
//! use firedrill_events::{EventBus, SimEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(SimEvent::system("drill started"));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "system");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::SimEvent;
