//! echoflow - paced, echo-acknowledged automation of remote terminal sessions
//!
//! Interactive remote shells, network device CLIs in particular, drop input
//! when it arrives faster than they can process it. echoflow never sends
//! the next line until the remote has acknowledged the previous one by
//! echoing it back, and recognises a command's completion by the session's
//! own prompt reappearing.
//!
//! ## Module Organization
//!
//! - [`transfer`] - Line segmentation, the paced sender, timeout policies,
//!   bulk transfer
//! - [`session`] - The [`Transport`] seam, PTY-backed transport and its
//!   screen model, prompt detection, command execution
//! - [`orchestrator`] - Batch runs over many targets, result sinks, run report
//! - [`pty`] - Pseudoterminal spawning and async I/O bridging
//! - [`models`] - Targets, command lists, results, error records
//! - [`config`] - Configuration loading and validation
//! - [`cli`] - Command-line interface definition
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use echoflow::{BatchOrchestrator, ConfigLoader, FileSink, PtyTransport, RemoteTarget};
//!
//! # async fn example() -> echoflow::Result<()> {
//! let config = ConfigLoader::load()?;
//! let mut transport = PtyTransport::new(config.connect_settings());
//! let targets = RemoteTarget::load_list(&config.output.target_list)?;
//!
//! let sink = FileSink::new(&config.output.directory);
//! let mut orchestrator = BatchOrchestrator::new(config.orchestrator_settings(), sink);
//! let report = orchestrator
//!     .run(&mut transport, &targets, &config.command_spec())
//!     .await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Everything runs on one logical thread of control: targets are processed
//! one after another and every wait is bounded. The PTY transport reads and
//! writes its pseudoterminal on two background threads and hands data to
//! the async engine over `tokio::mpsc` channels.

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pty;
pub mod session;
pub mod transfer;

// Re-exports for core functionality
pub use config::{Config, ConfigLoader};
pub use error::{Error, Result};
pub use models::{AuthMode, CommandResult, CommandSpec, ErrorRecord, RemoteTarget};
pub use orchestrator::{BatchOrchestrator, FileSink, MemorySink, ResultSink, RunReport};
pub use session::{PromptDetector, PromptSignature, PtyTransport, Transport};
pub use transfer::{
    transfer_text, LineSegmenter, PacedSender, TimeoutAction, TimeoutPolicy, TransferReport,
};

// Version information
/// The current version of echoflow from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
