//! Error types and Result aliases for echoflow

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for echoflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for echoflow
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Session errors ===
    /// Target unreachable or rejected the connection
    #[error("Error connecting to {target}: {reason}")]
    ConnectFailed { target: String, reason: String },

    /// An operation needed a live session but none is connected
    #[error("No active session")]
    NotConnected,

    /// The session did not report disconnection within the bound
    #[error("Session to {target} still connected after {waited:?}")]
    DisconnectTimeout { target: String, waited: Duration },

    /// The remote screen never went quiet, or the prompt row was empty
    #[error("Could not detect shell prompt: {reason}")]
    PromptNotDetected { reason: String },

    /// Failed to write to the session transport
    #[error("Failed to send to session: {reason}")]
    SendFailed { reason: String },

    /// Failed to spawn the connect program
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    // === Transfer errors ===
    /// A sent line was not acknowledged in time
    #[error(
        "Sent {confirmed} lines, but line {line_number} was not echoed back within {timeout:?}"
    )]
    AckTimeout {
        line_number: usize,
        confirmed: usize,
        timeout: Duration,
    },

    /// The caller's policy chose to stop a transfer after a timeout
    #[error("Transfer abandoned after {confirmed} confirmed lines: {cause}")]
    TransferAborted {
        confirmed: usize,
        #[source]
        cause: Box<Error>,
    },

    /// The mode probe did not see the expected response
    #[error("Session is not in the expected mode: {reason}")]
    ModeCheckFailed { reason: String },

    // === Command errors ===
    /// A command's initial send was not confirmed
    #[error("Command '{command}' abandoned: {reason}")]
    CommandAbandoned { command: String, reason: String },

    /// The prompt did not reappear after a command
    #[error("Command '{command}' did not complete within {duration:?}")]
    CommandTimeout { command: String, duration: Duration },

    // === Output errors ===
    /// Writing a result artifact failed
    #[error("Failed to persist results to '{}': {reason}", path.display())]
    PersistenceFailed { path: PathBuf, reason: String },

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Target list file missing or unreadable
    #[error("Target list '{}' not usable: {reason}", path.display())]
    TargetListUnavailable { path: PathBuf, reason: String },

    // === I/O and serialization errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors (for cases not yet categorized)
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Errors that stop the whole run instead of just the current target
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::PersistenceFailed { .. } | Error::DisconnectTimeout { .. }
        )
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigSerializationFailed {
            format: "TOML".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
