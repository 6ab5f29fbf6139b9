//! Mock Transport for Testing
//!
//! Simulates a set of remote hosts behind one terminal view. Each host
//! echoes what it receives, prints scripted output and its prompt. Waits
//! resolve immediately against the buffered stream.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use echoflow::session::{CursorPosition, Transport};
use echoflow::{AuthMode, Error, RemoteTarget, Result};

/// Something the mock observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Connect(String),
    Disconnect(String),
    IsConnected(bool),
    Send(String),
}

/// Behaviour of one simulated host
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    prompt: String,
    banner: String,
    responses: HashMap<String, String>,
    raw_replies: HashMap<String, String>,
    silent: HashSet<String>,
    refuse: Option<String>,
}

impl MockHost {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            ..Self::default()
        }
    }

    /// A host that rejects the connection with `reason`
    pub fn refusing(reason: &str) -> Self {
        Self {
            refuse: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn banner(mut self, banner: &str) -> Self {
        self.banner = banner.to_string();
        self
    }

    /// Print `output` after the echo of `command`
    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), output.to_string());
        self
    }

    /// Reply to `command` with exactly `raw`, echo and prompt included
    pub fn raw_reply(mut self, command: &str, raw: &str) -> Self {
        self.raw_replies
            .insert(command.to_string(), raw.to_string());
        self
    }

    /// Never echo `line`
    pub fn swallow(mut self, line: &str) -> Self {
        self.silent.insert(line.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct MockTransport {
    hosts: HashMap<String, MockHost>,
    current: Option<String>,
    closing: bool,
    linger: usize,
    stuck: bool,
    stream: String,
    row_text: String,
    cursor: CursorPosition,
    cursor_moved: bool,
    no_prompt_after: HashSet<String>,
    events: Vec<MockEvent>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, name: &str, host: MockHost) -> Self {
        self.hosts.insert(name.to_string(), host);
        self
    }

    /// Keep reporting connected for `polls` checks after a disconnect
    pub fn linger(mut self, polls: usize) -> Self {
        self.linger = polls;
        self
    }

    /// Never report the session closed
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    /// Never print the prompt again after `command`
    pub fn hang_on(mut self, command: &str) -> Self {
        self.no_prompt_after.insert(command.to_string());
        self
    }

    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    pub fn sent(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Send(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Connect(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn host(&self) -> Option<&MockHost> {
        self.current.as_ref().and_then(|name| self.hosts.get(name))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self, target: &RemoteTarget, _auth: AuthMode) -> Result<()> {
        self.events.push(MockEvent::Connect(target.to_string()));
        let host = match self.hosts.get(target.as_str()) {
            Some(host) => host.clone(),
            None => {
                return Err(Error::ConnectFailed {
                    target: target.to_string(),
                    reason: "host unreachable".to_string(),
                })
            }
        };
        if let Some(reason) = host.refuse {
            return Err(Error::ConnectFailed {
                target: target.to_string(),
                reason,
            });
        }

        self.stream = format!("{}{}", host.banner, host.prompt);
        self.row_text = format!("{} ", host.prompt);
        self.cursor = CursorPosition::new(host.banner.matches('\n').count(), self.row_text.len());
        self.cursor_moved = !host.banner.is_empty();
        self.current = Some(target.to_string());
        self.closing = false;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(name) = &self.current {
            self.events.push(MockEvent::Disconnect(name.clone()));
            self.closing = true;
        }
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        let connected = if self.current.is_none() {
            false
        } else if !self.closing {
            true
        } else if self.stuck {
            true
        } else if self.linger > 0 {
            self.linger -= 1;
            true
        } else {
            self.current = None;
            self.closing = false;
            self.stream.clear();
            false
        };
        self.events.push(MockEvent::IsConnected(connected));
        connected
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        let host = match self.host() {
            Some(host) if !self.closing => host.clone(),
            _ => return Err(Error::NotConnected),
        };
        self.events.push(MockEvent::Send(text.to_string()));

        let line = text.trim_end_matches(['\r', '\n']);
        if host.silent.contains(line) {
            return Ok(());
        }
        if let Some(raw) = host.raw_replies.get(line) {
            self.stream.push_str(raw);
            self.cursor_moved = true;
            return Ok(());
        }

        self.stream.push_str(line);
        self.stream.push_str("\r\n");
        if let Some(output) = host.responses.get(line) {
            self.stream.push_str(output);
            if !output.ends_with('\n') {
                self.stream.push_str("\r\n");
            }
        }
        if !self.no_prompt_after.contains(line) {
            self.stream.push_str(&host.prompt);
        }
        self.cursor_moved = true;
        Ok(())
    }

    async fn wait_for_text(&mut self, pattern: &str, _timeout: Duration) -> Result<bool> {
        match self.stream.find(pattern) {
            Some(pos) => {
                self.stream.drain(..pos + pattern.len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn wait_for_cursor_move(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(std::mem::take(&mut self.cursor_moved))
    }

    fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    fn read_region(&self, row: usize, from_col: usize, to_col: usize) -> String {
        if row != self.cursor.row {
            return String::new();
        }
        self.row_text
            .chars()
            .skip(from_col)
            .take(to_col.saturating_sub(from_col))
            .collect()
    }

    async fn read_until(&mut self, terminator: &str, _timeout: Duration) -> Result<Option<String>> {
        match self.stream.find(terminator) {
            Some(pos) => {
                let before = self.stream[..pos].to_string();
                self.stream.drain(..pos + terminator.len());
                Ok(Some(before))
            }
            None => Ok(None),
        }
    }

    fn drain_input(&mut self) -> usize {
        let len = self.stream.len();
        self.stream.clear();
        len
    }
}
