//! Core data models for echoflow
//!
//! This module contains the data structures that flow through a run:
//! targets and command lists going in, command results and error records
//! coming out.

pub mod auth;
pub mod command_result;
pub mod target;

// Re-exports for convenience
pub use auth::AuthMode;
pub use command_result::{CommandResult, ErrorRecord};
pub use target::{CommandSpec, RemoteTarget};
