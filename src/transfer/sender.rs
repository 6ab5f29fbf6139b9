//! Paced Line Sender
//!
//! Sends one line at a time and blocks until the remote acknowledges it,
//! either by echoing the text back or, for empty lines, by moving the
//! cursor. A line that is not acknowledged within the bound is `TimedOut`;
//! the sender never retries on its own.

use std::time::Duration;

use crate::error::Result;
use crate::session::Transport;

/// Default acknowledgment bound per line
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(3);

/// Default bound for the blank-line mode probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of sending one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Confirmed,
    TimedOut,
}

/// Sender state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
    AwaitingAck,
    Confirmed,
    TimedOut,
}

/// What counts as acknowledgment for a non-empty line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AckMatcher {
    /// The line text itself is echoed back
    #[default]
    Echo,
    /// A fixed marker appears, e.g. the `)#` of a configuration-mode prompt
    Pattern(String),
}

/// Pacing parameters shared by bulk transfers and command submission
#[derive(Debug, Clone)]
pub struct PacingSettings {
    pub ack_timeout: Duration,
    pub terminator: String,
    pub ack: AckMatcher,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            terminator: "\r".to_string(),
            ack: AckMatcher::Echo,
        }
    }
}

/// One-line-at-a-time sender
#[derive(Debug)]
pub struct PacedSender {
    settings: PacingSettings,
    state: SendState,
    confirmed: usize,
    sent: usize,
}

impl PacedSender {
    pub fn new(settings: PacingSettings) -> Self {
        Self {
            settings,
            state: SendState::Idle,
            confirmed: 0,
            sent: 0,
        }
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    /// Lines acknowledged so far
    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    /// Lines transmitted so far, acknowledged or not
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn settings(&self) -> &PacingSettings {
        &self.settings
    }

    /// Send `line` plus the terminator and wait for acknowledgment
    pub async fn send_line(
        &mut self,
        transport: &mut dyn Transport,
        line: &str,
    ) -> Result<TransferOutcome> {
        self.transition(SendState::Sending);
        let mut payload = String::with_capacity(line.len() + self.settings.terminator.len());
        payload.push_str(line);
        payload.push_str(&self.settings.terminator);
        if let Err(e) = transport.send(&payload).await {
            self.transition(SendState::Idle);
            return Err(e);
        }
        self.sent += 1;

        self.transition(SendState::AwaitingAck);
        let timeout = self.settings.ack_timeout;
        let acknowledged = if line.is_empty() {
            // Nothing to match on; a moving cursor is the only evidence
            transport.wait_for_cursor_move(timeout).await?
        } else {
            match &self.settings.ack {
                AckMatcher::Echo => transport.wait_for_text(line, timeout).await?,
                AckMatcher::Pattern(marker) => transport.wait_for_text(marker, timeout).await?,
            }
        };

        if acknowledged {
            self.confirmed += 1;
            self.transition(SendState::Confirmed);
            Ok(TransferOutcome::Confirmed)
        } else {
            self.transition(SendState::TimedOut);
            debug!(
                "Line {} ({} chars) not acknowledged within {:?}",
                self.sent,
                line.len(),
                timeout
            );
            Ok(TransferOutcome::TimedOut)
        }
    }

    fn transition(&mut self, next: SendState) {
        trace!("paced sender: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Handshake before a bulk transfer: send a blank line and expect a
/// response within `timeout`.
///
/// With a `marker`, the response must contain that text (for example the
/// `)#` ending a configuration-mode prompt); otherwise any cursor movement
/// counts.
pub async fn probe_mode(
    transport: &mut dyn Transport,
    terminator: &str,
    marker: Option<&str>,
    timeout: Duration,
) -> Result<()> {
    transport.send(terminator).await?;
    let responded = match marker {
        Some(marker) => transport.wait_for_text(marker, timeout).await?,
        None => transport.wait_for_cursor_move(timeout).await?,
    };

    if responded {
        debug!("Mode probe answered");
        Ok(())
    } else {
        let reason = match marker {
            Some(marker) => format!("'{}' not seen within {:?}", marker, timeout),
            None => format!("no response to a blank line within {:?}", timeout),
        };
        Err(crate::error::Error::ModeCheckFailed { reason })
    }
}
