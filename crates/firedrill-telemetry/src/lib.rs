//! Firedrill Telemetry - logging setup for the drill server and CLI.
//!
//! # Example
//!
//! ```rust,no_run
//! use firedrill_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), firedrill_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("firedrill_runtime=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("drill server starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(any(feature = "config", test))]
mod config;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
