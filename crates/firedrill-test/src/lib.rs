//! Firedrill Test - shared test utilities for the Firedrill crates.
//!
//! This crate provides mock implementations and fixtures used across the
//! workspace as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! firedrill-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use firedrill_test::{MockLlmProvider, calm_random, fresh_session};
//!
//! #[tokio::test]
//! async fn narrates_with_mock() {
//!     let provider = MockLlmProvider::repeating("Acknowledged.");
//!     let mut session = fresh_session();
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mock_llm;
pub mod random;

pub use fixtures::*;
pub use mock_llm::*;
pub use random::*;
