//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod play;
pub(crate) mod serve;
