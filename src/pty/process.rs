//! PTY Process Spawning
//!
//! Launches the connect program in a pseudoterminal and wires its master
//! side to a reader and a writer thread.

use std::io::{Read, Write};
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc::unbounded_channel;

use super::streams::PtyStreams;
use crate::error::{Error, Result};

/// Terminal geometry and environment for a spawned session
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub rows: u16,
    pub cols: u16,
    /// Extra environment variables for the child
    pub env: Vec<(String, String)>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            // Keep remote output free of colour where the remote honours it
            env: vec![("TERM".to_string(), "vt100".to_string())],
        }
    }
}

/// A running program attached to a PTY
pub struct PtySession {
    child: Box<dyn Child + Send + Sync>,
    // Held so the PTY stays open for the session's lifetime
    _master: Box<dyn MasterPty + Send>,
    streams: PtyStreams,
}

impl PtySession {
    pub fn streams(&mut self) -> &mut PtyStreams {
        &mut self.streams
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Whether the child has not exited yet
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Ask the child to terminate
    pub fn kill(&mut self) -> Result<()> {
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already gone
            Err(_) if !self.is_running() => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("pid", &self.child.process_id())
            .finish()
    }
}

/// Spawn `program` with `args` inside a new PTY
pub fn spawn_session(program: &str, args: &[String], config: &SpawnConfig) -> Result<PtySession> {
    let spawn_error = |reason: String| Error::SpawnFailed {
        program: program.to_string(),
        reason,
    };

    let pair = native_pty_system()
        .openpty(PtySize {
            rows: config.rows,
            cols: config.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| spawn_error(e.to_string()))?;

    let mut cmd_builder = CommandBuilder::new(program);
    cmd_builder.args(args);
    for (key, value) in &config.env {
        cmd_builder.env(key, value);
    }

    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| spawn_error(e.to_string()))?;
    // The child owns its end now; dropping ours lets EOF through on exit
    drop(pair.slave);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| spawn_error(format!("cannot clone PTY reader: {}", e)))?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| spawn_error(format!("cannot take PTY writer: {}", e)))?;

    debug!(
        "Spawned '{}' with {} args (pid {:?})",
        program,
        args.len(),
        child.process_id()
    );

    Ok(PtySession {
        child,
        _master: pair.master,
        streams: bridge_streams(reader, writer),
    })
}

/// Bridge blocking PTY I/O to async via channels and two threads
fn bridge_streams(
    mut master_reader: Box<dyn Read + Send>,
    mut master_writer: Box<dyn Write + Send>,
) -> PtyStreams {
    let (tx_out, rx_out) = unbounded_channel::<Vec<u8>>();
    let (tx_in, rx_in) = channel::<Vec<u8>>();

    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 5;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - remote closed");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;
                    if tx_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    consecutive_errors += 1;
                    // EIO is how Linux reports the slave side closing
                    debug!(
                        "PTY read error ({}): {} ({}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        break;
                    }
                    thread::sleep(Duration::from_millis(50));
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    thread::spawn(move || {
        while let Ok(data) = rx_in.recv() {
            let written = loop {
                match master_writer.write_all(&data) {
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    other => break other,
                }
            };
            if let Err(e) = written.and_then(|_| master_writer.flush()) {
                warn!("PTY write error ({}): {}", e.kind(), e);
                break;
            }
        }
        debug!("PTY writer thread exiting");
    });

    PtyStreams::from_channels(rx_out, tx_in)
}
