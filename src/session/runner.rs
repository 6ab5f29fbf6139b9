//! Command Runner
//!
//! Submits one command through the paced sender and captures everything the
//! remote prints until the session prompt comes back.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::prompt::PromptSignature;
use crate::error::{Error, Result};
use crate::session::Transport;
use crate::transfer::{AckMatcher, PacedSender, PacingSettings, TransferOutcome};

/// Default bound for each of the CR and LF echo phases
pub const DEFAULT_ECHO_PHASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound for a command's output to end with the prompt
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// CSI, OSC and two-byte escape sequences
static ESCAPE_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[@-Z\\-_])")
        .expect("escape sequence pattern is valid")
});

/// Remove terminal escape sequences from captured text
pub fn strip_escapes(text: &str) -> String {
    ESCAPE_SEQUENCE.replace_all(text, "").into_owned()
}

/// Runner parameters
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub pacing: PacingSettings,
    pub echo_phase_timeout: Duration,
    pub command_timeout: Duration,
    /// Strip escape sequences from captured output. The PTY transport already
    /// hands over screen text; this covers transports that pass raw bytes.
    pub ignore_escapes: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            pacing: PacingSettings::default(),
            echo_phase_timeout: DEFAULT_ECHO_PHASE_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            ignore_escapes: false,
        }
    }
}

/// A command and the output captured for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub output: String,
}

/// Runs commands against one session, terminating output at its prompt
#[derive(Debug)]
pub struct CommandRunner<'p> {
    prompt: &'p PromptSignature,
    settings: RunnerSettings,
}

impl<'p> CommandRunner<'p> {
    pub fn new(prompt: &'p PromptSignature, mut settings: RunnerSettings) -> Self {
        // A command is acknowledged by its own echo, never by a marker
        settings.pacing.ack = AckMatcher::Echo;
        Self { prompt, settings }
    }

    pub fn prompt(&self) -> &PromptSignature {
        self.prompt
    }

    /// Send `command` and capture its output.
    ///
    /// The command is abandoned with `Error::CommandAbandoned` if its echo
    /// never arrives; `Error::CommandTimeout` if the prompt does not return.
    pub async fn run(&self, transport: &mut dyn Transport, command: &str) -> Result<CommandOutput> {
        let command = command.trim();
        let mut sender = PacedSender::new(self.settings.pacing.clone());

        if sender.send_line(transport, command).await? == TransferOutcome::TimedOut {
            return Err(Error::CommandAbandoned {
                command: command.to_string(),
                reason: format!(
                    "not echoed back within {:?}",
                    self.settings.pacing.ack_timeout
                ),
            });
        }

        // The rest of the echoed line; missing either half is not fatal
        for marker in ["\r", "\n"] {
            if !transport
                .wait_for_text(marker, self.settings.echo_phase_timeout)
                .await?
            {
                debug!(
                    "No {:?} after echo of '{}' within {:?}",
                    marker, command, self.settings.echo_phase_timeout
                );
            }
        }

        let raw = transport
            .read_until(self.prompt.as_str(), self.settings.command_timeout)
            .await?
            .ok_or_else(|| Error::CommandTimeout {
                command: command.to_string(),
                duration: self.settings.command_timeout,
            })?;

        let output = if self.settings.ignore_escapes {
            strip_escapes(&raw).trim().to_string()
        } else {
            raw.trim().to_string()
        };
        debug!("'{}' produced {} bytes of output", command, output.len());

        Ok(CommandOutput {
            command: command.to_string(),
            output,
        })
    }
}
