//! Remote session handling
//!
//! The [`Transport`] seam, the PTY-backed implementation with its screen
//! model, prompt detection and single-command execution.

pub mod prompt;
pub mod pty_transport;
pub mod runner;
pub mod screen;
pub mod transport;


// Re-exports for convenience
pub use prompt::{PromptDetector, PromptSignature, DEFAULT_QUIESCENCE, DEFAULT_SETTLE_LIMIT};
pub use pty_transport::{ConnectSettings, PtyTransport, DEFAULT_CONNECT_TIMEOUT};
pub use runner::{
    strip_escapes, CommandOutput, CommandRunner, RunnerSettings, DEFAULT_COMMAND_TIMEOUT,
    DEFAULT_ECHO_PHASE_TIMEOUT,
};
pub use screen::TerminalScreen;
pub use transport::{CursorPosition, Transport};
