//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_events::prelude::*;` to import all essential types.

pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver, SimEvent};
