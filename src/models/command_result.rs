//! Command Result Model
//!
//! A `CommandResult` is created once per successfully completed command and
//! never mutated afterwards. An `ErrorRecord` captures the single failure a
//! target may contribute to a run.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::RemoteTarget;

/// Captured output of one command on one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Target the command ran on
    pub target: RemoteTarget,

    /// 1-based position of the command in the command list
    pub ordinal: usize,

    /// The command text that was sent
    pub command: String,

    /// Everything the remote printed between the command echo and the prompt
    pub output: String,

    /// When the output was captured
    pub captured_at: DateTime<Local>,
}

impl CommandResult {
    pub fn new(target: RemoteTarget, ordinal: usize, command: String, output: String) -> Self {
        Self {
            target,
            ordinal,
            command,
            output,
            captured_at: Local::now(),
        }
    }

    /// Zero-padded ordinal tag (`01`, `02`, ...) so artifacts sort in
    /// execution order
    pub fn ordinal_tag(&self) -> String {
        format_ordinal(self.ordinal)
    }
}

/// Format an ordinal with a minimum width of two digits
pub fn format_ordinal(ordinal: usize) -> String {
    format!("{:02}", ordinal)
}

/// The one failure recorded for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub target: RemoteTarget,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(target: RemoteTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
        }
    }
}
