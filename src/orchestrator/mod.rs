//! Batch Session Orchestrator
//!
//! Walks a list of targets one at a time over a single transport: connect,
//! capture the prompt, run every command, persist each result, disconnect
//! and wait for the session to close before touching the next target.
//!
//! A target's failure is recorded and the run moves on. Failures that leave
//! the run unable to continue (results that cannot be persisted, a session
//! that will not close) stop the run.

pub mod report;
pub mod sink;

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::models::{AuthMode, CommandResult, CommandSpec, ErrorRecord, RemoteTarget};
use crate::session::{CommandRunner, PromptDetector, RunnerSettings, Transport};

pub use report::{RunReport, FAILURE_HEADING, SUCCESS_MESSAGE};
pub use sink::{artifact_name, FileSink, MemorySink, ResultSink, LINE_SEPARATOR, SUMMARY_FILE};

/// Default interval between disconnect polls
pub const DEFAULT_DISCONNECT_POLL: Duration = Duration::from_millis(100);

/// Default bound on waiting for a session to close
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause after a session closes, before the next connect
pub const DEFAULT_POST_DISCONNECT_DELAY: Duration = Duration::from_secs(1);

/// Where one target is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Connecting,
    Connected,
    RunningCommands,
    Disconnecting,
    Done,
    ConnectFailed,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetState::Connecting => "connecting",
            TargetState::Connected => "connected",
            TargetState::RunningCommands => "running commands",
            TargetState::Disconnecting => "disconnecting",
            TargetState::Done => "done",
            TargetState::ConnectFailed => "connect failed",
        };
        f.write_str(name)
    }
}

/// Orchestrator parameters
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Authentication mode used for every target
    pub auth: AuthMode,
    pub prompt: PromptDetector,
    pub runner: RunnerSettings,
    pub disconnect_poll: Duration,
    pub disconnect_timeout: Duration,
    pub post_disconnect_delay: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            auth: AuthMode::default(),
            prompt: PromptDetector::default(),
            runner: RunnerSettings::default(),
            disconnect_poll: DEFAULT_DISCONNECT_POLL,
            disconnect_timeout: DEFAULT_DISCONNECT_TIMEOUT,
            post_disconnect_delay: DEFAULT_POST_DISCONNECT_DELAY,
        }
    }
}

/// How far an error unwinds
enum Abort {
    /// Record it against the target and continue with the next one
    Target(Error),
    /// Stop the run
    Run(Error),
}

impl From<Error> for Abort {
    fn from(err: Error) -> Self {
        if err.is_fatal() {
            Abort::Run(err)
        } else {
            Abort::Target(err)
        }
    }
}

/// Runs a command list against many targets, one after another
pub struct BatchOrchestrator<S: ResultSink> {
    settings: OrchestratorSettings,
    sink: S,
}

impl<S: ResultSink> BatchOrchestrator<S> {
    pub fn new(settings: OrchestratorSettings, sink: S) -> Self {
        Self { settings, sink }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process every target in order.
    ///
    /// Returns the run report when the run got through all targets, even if
    /// some of them failed; an `Err` means the run itself had to stop.
    pub async fn run(
        &mut self,
        transport: &mut dyn Transport,
        targets: &[RemoteTarget],
        commands: &CommandSpec,
    ) -> Result<RunReport> {
        let mut report = RunReport::new();
        info!(
            "Run {}: {} targets, {} commands each",
            report.run_id,
            targets.len(),
            commands.len()
        );

        for target in targets {
            report.targets_processed += 1;
            match self
                .process_target(transport, target, commands, &mut report)
                .await
            {
                Ok(()) => {}
                Err(Abort::Target(err)) => {
                    warn!("{}: {}", target, err);
                    report.record_error(ErrorRecord::new(target.clone(), error_message(target, &err)));
                }
                Err(Abort::Run(err)) => {
                    error!("Run {} stopped at {}: {}", report.run_id, target, err);
                    return Err(err);
                }
            }
        }

        report.finish();
        self.sink.finish(&report)?;
        info!(
            "Run {} finished: {} results, {} errors",
            report.run_id,
            report.results,
            report.errors.len()
        );
        Ok(report)
    }

    async fn process_target(
        &mut self,
        transport: &mut dyn Transport,
        target: &RemoteTarget,
        commands: &CommandSpec,
        report: &mut RunReport,
    ) -> std::result::Result<(), Abort> {
        let mut state = TargetState::Connecting;
        debug!("{}: {}", target, state);

        if let Err(err) = transport.connect(target, self.settings.auth).await {
            transition(target, &mut state, TargetState::ConnectFailed);
            return Err(Abort::Target(err));
        }
        transition(target, &mut state, TargetState::Connected);

        let outcome = self
            .run_commands(transport, target, commands, &mut state, report)
            .await;

        // Leave the transport free for the next target whatever happened
        transition(target, &mut state, TargetState::Disconnecting);
        self.close_session(transport, target).await?;
        transition(target, &mut state, TargetState::Done);

        outcome
    }

    async fn run_commands(
        &mut self,
        transport: &mut dyn Transport,
        target: &RemoteTarget,
        commands: &CommandSpec,
        state: &mut TargetState,
        report: &mut RunReport,
    ) -> std::result::Result<(), Abort> {
        let prompt = self.settings.prompt.capture(transport).await?;
        let runner = CommandRunner::new(&prompt, self.settings.runner.clone());

        transition(target, state, TargetState::RunningCommands);
        for (index, command) in commands.iter().enumerate() {
            let output = runner.run(transport, command).await?;
            let result = CommandResult::new(target.clone(), index + 1, output.command, output.output);
            self.sink.persist(&result).map_err(Abort::Run)?;
            report.results += 1;
        }
        Ok(())
    }

    async fn close_session(
        &self,
        transport: &mut dyn Transport,
        target: &RemoteTarget,
    ) -> std::result::Result<(), Abort> {
        disconnect_and_wait(
            transport,
            target,
            self.settings.disconnect_poll,
            self.settings.disconnect_timeout,
        )
        .await
        .map_err(Abort::Run)?;
        tokio::time::sleep(self.settings.post_disconnect_delay).await;
        Ok(())
    }
}

/// Ask `transport` to disconnect, then poll every `poll` until it reports
/// the session closed. `Error::DisconnectTimeout` if that takes longer than
/// `timeout`.
pub async fn disconnect_and_wait(
    transport: &mut dyn Transport,
    target: &RemoteTarget,
    poll: Duration,
    timeout: Duration,
) -> Result<()> {
    if let Err(err) = transport.disconnect().await {
        warn!("{}: disconnect request failed: {}", target, err);
    }

    let started = Instant::now();
    while transport.is_connected() {
        if started.elapsed() >= timeout {
            return Err(Error::DisconnectTimeout {
                target: target.to_string(),
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(poll).await;
    }
    debug!("{}: session closed after {:?}", target, started.elapsed());
    Ok(())
}

fn transition(target: &RemoteTarget, state: &mut TargetState, next: TargetState) {
    debug!("{}: {} -> {}", target, state, next);
    *state = next;
}

/// Message for a target's error record; connect errors already name the target
fn error_message(target: &RemoteTarget, err: &Error) -> String {
    match err {
        Error::ConnectFailed { .. } => err.to_string(),
        _ => format!("{}: {}", target, err),
    }
}
