//! PTY-backed Transport
//!
//! Opens each target by running a connect program (`ssh` unless configured
//! otherwise) inside a pseudoterminal. Output is fed through a
//! [`TerminalScreen`] so the engine can track the cursor and match text.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::screen::TerminalScreen;
use super::transport::{CursorPosition, Transport};
use crate::error::{Error, Result};
use crate::models::{AuthMode, RemoteTarget};
use crate::pty::streams::ReadEvent;
use crate::pty::{spawn_session, PtySession, SpawnConfig};

/// Placeholder in connect arguments replaced by the target identifier
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Default bound for a connect attempt to show a live session
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Output must go quiet this long, with the program still running, before a
/// connect attempt counts as established
const CONNECT_SETTLE: Duration = Duration::from_millis(500);

/// How to launch a session for a target
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    pub program: String,
    /// Arguments placed before the target; `{target}` is substituted in place
    pub args: Vec<String>,
    /// Pass `StrictHostKeyChecking=accept-new` when the program is ssh
    pub accept_host_keys: bool,
    pub connect_timeout: Duration,
    pub spawn: SpawnConfig,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            args: Vec::new(),
            accept_host_keys: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            spawn: SpawnConfig::default(),
        }
    }
}

impl ConnectSettings {
    /// Whether the connect program is an ssh client
    pub fn is_ssh(&self) -> bool {
        Path::new(&self.program)
            .file_stem()
            .map(|stem| stem == "ssh")
            .unwrap_or(false)
    }

    /// Full argument list for connecting to `target`. Authentication and
    /// host key options are only given to ssh.
    pub fn build_args(&self, target: &RemoteTarget, auth: AuthMode) -> Vec<String> {
        let mut args = Vec::new();
        if self.is_ssh() {
            for option in auth.ssh_options() {
                args.push("-o".to_string());
                args.push(option);
            }
            if self.accept_host_keys {
                args.push("-o".to_string());
                args.push("StrictHostKeyChecking=accept-new".to_string());
            }
        }

        let mut substituted = false;
        for arg in &self.args {
            if arg.contains(TARGET_PLACEHOLDER) {
                substituted = true;
                args.push(arg.replace(TARGET_PLACEHOLDER, target.as_str()));
            } else {
                args.push(arg.clone());
            }
        }
        if !substituted {
            args.push(target.to_string());
        }
        args
    }
}

/// [`Transport`] over a spawned connect program
pub struct PtyTransport {
    settings: ConnectSettings,
    session: Option<PtySession>,
    screen: TerminalScreen,
    target: Option<RemoteTarget>,
}

impl PtyTransport {
    pub fn new(settings: ConnectSettings) -> Self {
        let screen = TerminalScreen::new(
            settings.spawn.rows as usize,
            settings.spawn.cols as usize,
        );
        Self {
            settings,
            session: None,
            screen,
            target: None,
        }
    }

    pub fn settings(&self) -> &ConnectSettings {
        &self.settings
    }

    fn session_mut(&mut self) -> Result<&mut PtySession> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }

    /// Wait at most `timeout` for the next output and feed it to the screen.
    /// Returns `None` when nothing arrived, `Some(moved)` otherwise.
    async fn pump(&mut self, timeout: Duration) -> Result<Option<bool>> {
        let session = self.session_mut()?;
        match session.streams().recv_timeout(timeout).await {
            ReadEvent::Data(bytes) => Ok(Some(self.screen.feed(&bytes))),
            ReadEvent::Idle | ReadEvent::Closed => Ok(None),
        }
    }

    /// Feed output until `done` holds or `timeout` expires
    async fn pump_until<F>(&mut self, timeout: Duration, mut done: F) -> Result<bool>
    where
        F: FnMut(&mut TerminalScreen) -> bool + Send,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if done(&mut self.screen) {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            if self.pump(remaining).await?.is_none() {
                let closed = self
                    .session
                    .as_mut()
                    .map(|s| s.streams().is_closed())
                    .unwrap_or(true);
                if closed || Instant::now() >= deadline {
                    return Ok(done(&mut self.screen));
                }
            }
        }
    }

    fn last_output_line(&self) -> String {
        self.screen
            .pending()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or("connection closed")
            .to_string()
    }

    async fn establish(&mut self, target: &RemoteTarget) -> Result<()> {
        let deadline = Instant::now() + self.settings.connect_timeout;
        let mut seen_output = false;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::ConnectFailed {
                    target: target.to_string(),
                    reason: format!(
                        "no session output within {:?}",
                        self.settings.connect_timeout
                    ),
                });
            }
            let wait = if seen_output {
                remaining.min(CONNECT_SETTLE)
            } else {
                remaining
            };

            let session = self.session_mut()?;
            match session.streams().recv_timeout(wait).await {
                ReadEvent::Data(bytes) => {
                    self.screen.feed(&bytes);
                    seen_output = true;
                }
                ReadEvent::Idle if seen_output => {
                    if !self.session_mut()?.is_running() {
                        break;
                    }
                    let last = self.last_output_line();
                    if awaits_secret(&last) {
                        return Err(Error::ConnectFailed {
                            target: target.to_string(),
                            reason: format!("authentication needs interactive input: {}", last),
                        });
                    }
                    return Ok(());
                }
                ReadEvent::Idle => {}
                ReadEvent::Closed => break,
            }
        }

        Err(Error::ConnectFailed {
            target: target.to_string(),
            reason: self.last_output_line(),
        })
    }
}

/// Whether `line` is a connect program asking for a password or passphrase
fn awaits_secret(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    line.ends_with("password:") || line.contains("passphrase for") || line.ends_with("passcode:")
}

impl Default for PtyTransport {
    fn default() -> Self {
        Self::new(ConnectSettings::default())
    }
}

#[async_trait]
impl Transport for PtyTransport {
    async fn connect(&mut self, target: &RemoteTarget, auth: AuthMode) -> Result<()> {
        if self.session.is_some() {
            warn!("Connect requested while a session is open, closing it first");
            self.disconnect().await?;
        }

        let args = self.settings.build_args(target, auth);
        debug!("Connecting to {} via '{}'", target, self.settings.program);
        let session = spawn_session(&self.settings.program, &args, &self.settings.spawn)
            .map_err(|e| Error::ConnectFailed {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        self.screen = TerminalScreen::new(
            self.settings.spawn.rows as usize,
            self.settings.spawn.cols as usize,
        );
        self.session = Some(session);
        self.target = Some(target.clone());

        if let Err(e) = self.establish(target).await {
            if let Some(mut session) = self.session.take() {
                let _ = session.kill();
            }
            self.target = None;
            return Err(e);
        }
        info!("Connected to {}", target);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.kill()?;
            debug!(
                "Disconnect requested for {}",
                self.target.as_ref().map(|t| t.as_str()).unwrap_or("?")
            );
        }
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        let running = self
            .session
            .as_mut()
            .map(|session| session.is_running())
            .unwrap_or(false);
        if !running && self.session.take().is_some() {
            self.target = None;
        }
        running
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        self.session_mut()?.streams().write(text.as_bytes())
    }

    async fn wait_for_text(&mut self, pattern: &str, timeout: Duration) -> Result<bool> {
        self.pump_until(timeout, |screen| screen.take_through(pattern))
            .await
    }

    async fn wait_for_cursor_move(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        // Movement already in the queue counts
        let queued = self.session_mut()?.streams().try_read_now();
        if !queued.is_empty() && self.screen.feed(&queued) {
            return Ok(true);
        }
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.pump(remaining).await? {
                Some(true) => return Ok(true),
                Some(false) => {}
                None => return Ok(false),
            }
        }
    }

    fn cursor(&self) -> CursorPosition {
        self.screen.cursor()
    }

    fn read_region(&self, row: usize, from_col: usize, to_col: usize) -> String {
        self.screen.row_text(row, from_col, to_col)
    }

    async fn read_until(&mut self, terminator: &str, timeout: Duration) -> Result<Option<String>> {
        let mut captured = None;
        self.pump_until(timeout, |screen| {
            captured = screen.take_until(terminator);
            captured.is_some()
        })
        .await?;
        Ok(captured)
    }

    fn drain_input(&mut self) -> usize {
        let queued = self
            .session
            .as_mut()
            .map(|session| session.streams().try_read_now())
            .unwrap_or_default();
        if !queued.is_empty() {
            self.screen.feed(&queued);
        }
        self.screen.discard_pending()
    }
}
