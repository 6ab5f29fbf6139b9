//! Timeout policies
//!
//! What happens after a line times out is the caller's decision, not the
//! sender's. Automated runs abort or continue; interactive runs ask.

use std::io::{BufRead, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Details handed to a policy when a line was not acknowledged
#[derive(Debug, Clone)]
pub struct TimeoutContext<'a> {
    /// 1-based number of the line that timed out
    pub line_number: usize,
    /// The line text, terminator excluded
    pub line: &'a str,
    /// Lines confirmed before this one
    pub confirmed: usize,
    /// The acknowledgment bound that expired
    pub timeout: Duration,
}

/// Decision returned by a [`TimeoutPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutDecision {
    Continue,
    Abort,
}

/// Strategy consulted whenever a line times out
pub trait TimeoutPolicy: Send {
    fn on_timeout(&mut self, ctx: &TimeoutContext<'_>) -> TimeoutDecision;
}

impl<F> TimeoutPolicy for F
where
    F: FnMut(&TimeoutContext<'_>) -> TimeoutDecision + Send,
{
    fn on_timeout(&mut self, ctx: &TimeoutContext<'_>) -> TimeoutDecision {
        self(ctx)
    }
}

/// Stop at the first unacknowledged line
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnTimeout;

impl TimeoutPolicy for AbortOnTimeout {
    fn on_timeout(&mut self, ctx: &TimeoutContext<'_>) -> TimeoutDecision {
        warn!(
            "Line {} not acknowledged within {:?}, abandoning transfer",
            ctx.line_number, ctx.timeout
        );
        TimeoutDecision::Abort
    }
}

/// Log and keep sending
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinueOnTimeout;

impl TimeoutPolicy for ContinueOnTimeout {
    fn on_timeout(&mut self, ctx: &TimeoutContext<'_>) -> TimeoutDecision {
        warn!(
            "Line {} not acknowledged within {:?}, continuing",
            ctx.line_number, ctx.timeout
        );
        TimeoutDecision::Continue
    }
}

/// Ask a human whether to keep going.
///
/// Anything other than an explicit yes aborts, matching a dialog whose
/// default button is "No".
pub struct AskOnTimeout<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead + Send, W: Write + Send> AskOnTimeout<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl AskOnTimeout<std::io::BufReader<std::io::Stdin>, std::io::Stderr> {
    /// Prompt on stderr, read the answer from stdin
    pub fn terminal() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R: BufRead + Send, W: Write + Send> TimeoutPolicy for AskOnTimeout<R, W> {
    fn on_timeout(&mut self, ctx: &TimeoutContext<'_>) -> TimeoutDecision {
        let asked = write!(
            self.output,
            "Sent {} lines, but the most recent line sent was not echoed back within {:?}.\nContinue? [y/N] ",
            ctx.line_number, ctx.timeout
        )
        .and_then(|_| self.output.flush());
        if let Err(e) = asked {
            warn!("Could not ask whether to continue: {}", e);
            return TimeoutDecision::Abort;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") => {
                TimeoutDecision::Continue
            }
            Ok(_) => TimeoutDecision::Abort,
            Err(e) => {
                warn!("Could not read answer: {}", e);
                TimeoutDecision::Abort
            }
        }
    }
}

/// Policy selectable from configuration and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutAction {
    #[default]
    Abort,
    Continue,
    Ask,
}

impl TimeoutAction {
    /// Build the policy this action names
    pub fn into_policy(self) -> Box<dyn TimeoutPolicy> {
        match self {
            TimeoutAction::Abort => Box::new(AbortOnTimeout),
            TimeoutAction::Continue => Box::new(ContinueOnTimeout),
            TimeoutAction::Ask => Box::new(AskOnTimeout::terminal()),
        }
    }
}

impl std::str::FromStr for TimeoutAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(TimeoutAction::Abort),
            "continue" => Ok(TimeoutAction::Continue),
            "ask" => Ok(TimeoutAction::Ask),
            other => Err(format!("unknown timeout action '{}'", other)),
        }
    }
}
