//! Configuration management for echoflow
//!
//! Timeouts, the connect program, transfer behaviour, output locations and
//! the default command list. Every section falls back to its defaults, so a
//! config file only needs the values it changes.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{AuthMode, CommandSpec};
use crate::orchestrator::OrchestratorSettings;
use crate::pty::SpawnConfig;
use crate::session::{ConnectSettings, PromptDetector, RunnerSettings};
use crate::transfer::{AckMatcher, PacingSettings, TimeoutAction, TransferOptions};

pub use loader::{ConfigFormat, ConfigLoader, CONFIG_ENV};

/// Main configuration structure for echoflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Commands run against every target when none are given on the
    /// command line
    pub commands: Vec<String>,

    pub timing: TimingConfig,
    pub connection: ConnectionConfig,
    pub transfer: TransferConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commands: vec![
                "show version | i ptime".to_string(),
                "show inventory".to_string(),
                "show running-config".to_string(),
            ],
            timing: TimingConfig::default(),
            connection: ConnectionConfig::default(),
            transfer: TransferConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Wait bounds, all in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Per-line acknowledgment bound
    pub ack_timeout_ms: u64,
    /// Bound for the blank-line mode probe
    pub probe_timeout_ms: u64,
    /// Quiet period that marks the screen as settled after connecting
    pub quiescence_ms: u64,
    /// Cap on how long the screen may keep changing after connecting
    pub settle_limit_ms: u64,
    /// Bound for each of the CR and LF echo phases of a command
    pub echo_phase_timeout_ms: u64,
    /// Bound for a command's output to end with the prompt
    pub command_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub disconnect_poll_ms: u64,
    pub disconnect_timeout_ms: u64,
    pub post_disconnect_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 3000,
            probe_timeout_ms: 1000,
            quiescence_ms: 1000,
            settle_limit_ms: 30_000,
            echo_phase_timeout_ms: 1000,
            command_timeout_ms: 30_000,
            connect_timeout_ms: 15_000,
            disconnect_poll_ms: 100,
            disconnect_timeout_ms: 10_000,
            post_disconnect_delay_ms: 1000,
        }
    }
}

/// How sessions are opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Program run in the PTY for each target
    pub program: String,
    /// Arguments before the target; `{target}` is replaced in place
    pub args: Vec<String>,
    pub auth: AuthMode,
    /// Accept unknown host keys on first connect
    pub accept_host_keys: bool,
    pub rows: u16,
    pub cols: u16,
    /// TERM given to the connect program
    pub term: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            args: Vec::new(),
            auth: AuthMode::default(),
            accept_host_keys: true,
            rows: 24,
            cols: 80,
            term: "vt100".to_string(),
        }
    }
}

/// Line pacing and paste behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Appended to every line sent
    pub terminator: String,
    pub on_timeout: TimeoutAction,
    /// Acknowledge pasted lines by this marker instead of their echo
    pub ack_pattern: Option<String>,
    /// Probe the session with a blank line before pasting
    pub check_mode: bool,
    /// Text the probe must see, e.g. `)#` for configuration mode
    pub mode_marker: Option<String>,
    pub skip_trailing_empty: bool,
    /// Strip escape sequences from captured command output
    pub ignore_escapes: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            terminator: "\r".to_string(),
            on_timeout: TimeoutAction::Abort,
            ack_pattern: None,
            check_mode: false,
            mode_marker: None,
            skip_trailing_empty: true,
            ignore_escapes: false,
        }
    }
}

/// Where inputs are read from and results written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub target_list: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            directory: home.join("LogOutputOfSpecificCommand"),
            target_list: home.join("Desktop").join("SessionList.txt"),
        }
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

impl Config {
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::new(self.commands.iter().cloned())
    }

    /// Pacing for bulk transfers; honours `ack_pattern`
    pub fn pacing(&self) -> PacingSettings {
        PacingSettings {
            ack_timeout: ms(self.timing.ack_timeout_ms),
            terminator: self.transfer.terminator.clone(),
            ack: match &self.transfer.ack_pattern {
                Some(marker) => AckMatcher::Pattern(marker.clone()),
                None => AckMatcher::Echo,
            },
        }
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            pacing: self.pacing(),
            skip_trailing_empty: self.transfer.skip_trailing_empty,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        ms(self.timing.probe_timeout_ms)
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            pacing: self.pacing(),
            echo_phase_timeout: ms(self.timing.echo_phase_timeout_ms),
            command_timeout: ms(self.timing.command_timeout_ms),
            ignore_escapes: self.transfer.ignore_escapes,
        }
    }

    pub fn prompt_detector(&self) -> PromptDetector {
        PromptDetector::new(
            ms(self.timing.quiescence_ms),
            ms(self.timing.settle_limit_ms),
        )
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            auth: self.connection.auth,
            prompt: self.prompt_detector(),
            runner: self.runner_settings(),
            disconnect_poll: ms(self.timing.disconnect_poll_ms),
            disconnect_timeout: ms(self.timing.disconnect_timeout_ms),
            post_disconnect_delay: ms(self.timing.post_disconnect_delay_ms),
        }
    }

    pub fn connect_settings(&self) -> ConnectSettings {
        ConnectSettings {
            program: self.connection.program.clone(),
            args: self.connection.args.clone(),
            accept_host_keys: self.connection.accept_host_keys,
            connect_timeout: ms(self.timing.connect_timeout_ms),
            spawn: SpawnConfig {
                rows: self.connection.rows,
                cols: self.connection.cols,
                env: vec![("TERM".to_string(), self.connection.term.clone())],
            },
        }
    }
}
