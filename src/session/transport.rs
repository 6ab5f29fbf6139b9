//! Session Transport Abstraction
//!
//! The engine never touches a terminal directly. Everything it needs from a
//! live session goes through [`Transport`], so the PTY-backed implementation
//! can be swapped for a scripted double in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AuthMode, RemoteTarget};

/// Zero-based cursor location on the session screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
}

impl CursorPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Operations a remote terminal session must provide.
///
/// Incoming data is held in an unconsumed stream until a wait or read call
/// takes it. Every wait is bounded by the timeout it is given. Only one
/// caller may drive a transport at a time.
#[async_trait]
pub trait Transport: Send {
    /// Open a session to `target`. Must not block beyond its own internal
    /// bound; a rejected or unreachable target is `Error::ConnectFailed`.
    async fn connect(&mut self, target: &RemoteTarget, auth: AuthMode) -> Result<()>;

    /// Ask the session to close. Completion is observed through
    /// [`Transport::is_connected`].
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether a session is currently live
    fn is_connected(&mut self) -> bool;

    /// Transmit raw text to the remote
    async fn send(&mut self, text: &str) -> Result<()>;

    /// Wait up to `timeout` for `pattern` to appear in the incoming stream.
    /// On success the stream is consumed through the end of the match.
    async fn wait_for_text(&mut self, pattern: &str, timeout: Duration) -> Result<bool>;

    /// Wait up to `timeout` for the cursor position to change
    async fn wait_for_cursor_move(&mut self, timeout: Duration) -> Result<bool>;

    /// Current cursor position
    fn cursor(&self) -> CursorPosition;

    /// Screen text of `row` from `from_col` (inclusive) to `to_col` (exclusive)
    fn read_region(&self, row: usize, from_col: usize, to_col: usize) -> String;

    /// Wait up to `timeout` for `terminator`, returning everything before it.
    /// The terminator itself is consumed. `None` on timeout, leaving the
    /// stream untouched.
    async fn read_until(&mut self, terminator: &str, timeout: Duration) -> Result<Option<String>>;

    /// Discard everything received so far from the unconsumed stream
    fn drain_input(&mut self) -> usize;
}
