//! Pseudoterminal (PTY) Management
//!
//! Spawns the connect program inside a pseudoterminal and bridges its
//! blocking I/O to async code.

pub mod process;
pub mod streams;

// Re-exports for convenience
pub use process::{spawn_session, PtySession, SpawnConfig};
pub use streams::PtyStreams;
