//! PTY Streams
//!
//! Async-friendly handles on a PTY's output and input, fed by the reader and
//! writer threads in [`super::process`].

use std::sync::mpsc::Sender as StdSender;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{Error, Result};

/// What one bounded read produced
#[derive(Debug, PartialEq, Eq)]
pub enum ReadEvent {
    Data(Vec<u8>),
    /// Nothing arrived within the bound
    Idle,
    /// The reader thread is gone; the remote end closed
    Closed,
}

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Output bytes from the PTY
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Input bytes to the PTY
    input_tx: StdSender<Vec<u8>>,
    closed: bool,
}

impl PtyStreams {
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
            closed: false,
        }
    }

    /// Queue bytes for the PTY writer thread
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|e| Error::SendFailed {
                reason: e.to_string(),
            })
    }

    /// Wait at most `timeout` for the next chunk of output
    pub async fn recv_timeout(&mut self, timeout: Duration) -> ReadEvent {
        if self.closed {
            return ReadEvent::Closed;
        }
        match tokio::time::timeout(timeout, self.output_rx.recv()).await {
            Ok(Some(bytes)) => ReadEvent::Data(bytes),
            Ok(None) => {
                self.closed = true;
                ReadEvent::Closed
            }
            Err(_) => ReadEvent::Idle,
        }
    }

    /// Take whatever output is already queued without waiting
    pub fn try_read_now(&mut self) -> Vec<u8> {
        let mut collected = Vec::new();
        loop {
            match self.output_rx.try_recv() {
                Ok(bytes) => collected.extend_from_slice(&bytes),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        collected
    }

    /// The PTY reported end of output
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
