//! Prelude module - commonly used types for convenient import.
//!
//! Use `use firedrill_test::prelude::*;` to import all essential types.

// Mocks
pub use crate::{MockCall, MockLlmProvider, MockLlmTurn};

// Randomness
pub use crate::{FixedRandom, ScriptedRandom, calm_random, failing_random};

// Fixtures
pub use crate::{
    drive_to_security_review, fresh_session, investigated, patch_to_completion, verify_all,
};
