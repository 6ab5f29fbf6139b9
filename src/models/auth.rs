//! Authentication mode used when opening every session of a run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed authentication mode for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Keyboard-interactive challenge/response
    KeyboardInteractive,
    /// Public key from the identity files only, agent disabled
    PublicKey,
    /// Plain password authentication
    Password,
    /// Keys held by the agent at `SSH_AUTH_SOCK`, then the identity files
    #[default]
    Agent,
}

impl AuthMode {
    /// The ssh `PreferredAuthentications` value for this mode
    pub fn ssh_method(&self) -> &'static str {
        match self {
            AuthMode::KeyboardInteractive => "keyboard-interactive",
            AuthMode::PublicKey | AuthMode::Agent => "publickey",
            AuthMode::Password => "password",
        }
    }

    /// Whether authenticating needs someone to type a secret
    pub fn is_interactive(&self) -> bool {
        matches!(self, AuthMode::KeyboardInteractive | AuthMode::Password)
    }

    /// ssh `-o` settings for this mode, as `Key=value` pairs.
    ///
    /// Key based modes run in batch mode so ssh fails instead of falling
    /// back to a password prompt nobody can answer.
    pub fn ssh_options(&self) -> Vec<String> {
        let mut options = vec![format!("PreferredAuthentications={}", self.ssh_method())];
        match self {
            AuthMode::PublicKey => options.push("IdentityAgent=none".to_string()),
            AuthMode::Agent => options.push("IdentityAgent=SSH_AUTH_SOCK".to_string()),
            AuthMode::KeyboardInteractive | AuthMode::Password => {}
        }
        if !self.is_interactive() {
            options.push("BatchMode=yes".to_string());
        }
        options
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthMode::KeyboardInteractive => "keyboard-interactive",
            AuthMode::PublicKey => "public-key",
            AuthMode::Password => "password",
            AuthMode::Agent => "agent",
        };
        f.write_str(name)
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyboard-interactive" | "keyboard" | "kbdint" => Ok(AuthMode::KeyboardInteractive),
            "public-key" | "publickey" | "key" => Ok(AuthMode::PublicKey),
            "password" => Ok(AuthMode::Password),
            "agent" => Ok(AuthMode::Agent),
            other => Err(format!("unknown authentication mode '{}'", other)),
        }
    }
}
