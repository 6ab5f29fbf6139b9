//! Prompt Detection
//!
//! Captures the remote shell prompt once, right after connecting, so it can
//! serve as the terminator of every command's output on that session.
//!
//! The captured text is taken literally. A prompt that changes between
//! commands (one that embeds the working directory, say) will not match
//! later and commands will time out waiting for it.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::session::Transport;

/// Default quiet period that marks the screen as settled
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_secs(1);

/// Default cap on how long the screen may keep changing after connect
pub const DEFAULT_SETTLE_LIMIT: Duration = Duration::from_secs(30);

/// Normalized prompt text of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSignature(String);

impl PromptSignature {
    /// Trim `raw`; `None` if nothing is left
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Waits for the screen to settle and reads the prompt off the cursor row
#[derive(Debug, Clone)]
pub struct PromptDetector {
    quiescence: Duration,
    settle_limit: Duration,
}

impl PromptDetector {
    pub fn new(quiescence: Duration, settle_limit: Duration) -> Self {
        Self {
            quiescence,
            settle_limit,
        }
    }

    /// Capture the prompt of a freshly connected session.
    ///
    /// Polls "did the cursor move within the quiescence window" until the
    /// answer is no, then reads the cursor row from column 0 up to the
    /// cursor. Output received before the prompt is discarded so it cannot
    /// be mistaken for the first command's echo.
    pub async fn capture(&self, transport: &mut dyn Transport) -> Result<PromptSignature> {
        let started = Instant::now();
        let mut polls = 0usize;
        while transport.wait_for_cursor_move(self.quiescence).await? {
            polls += 1;
            if started.elapsed() >= self.settle_limit {
                return Err(Error::PromptNotDetected {
                    reason: format!("screen still changing after {:?}", self.settle_limit),
                });
            }
        }

        let cursor = transport.cursor();
        let raw = transport.read_region(cursor.row, 0, cursor.col);
        let prompt = PromptSignature::new(&raw).ok_or_else(|| Error::PromptNotDetected {
            reason: format!("row {} is empty up to column {}", cursor.row, cursor.col),
        })?;

        let discarded = transport.drain_input();
        debug!(
            "Prompt '{}' captured after {} cursor moves ({} bytes of banner discarded)",
            prompt, polls, discarded
        );
        Ok(prompt)
    }
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new(DEFAULT_QUIESCENCE, DEFAULT_SETTLE_LIMIT)
    }
}
