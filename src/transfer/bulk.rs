//! Bulk paced transfer
//!
//! Drives a whole block of text through the [`PacedSender`], one logical
//! line at a time, consulting the caller's [`TimeoutPolicy`] whenever a line
//! goes unacknowledged.

use std::time::{Duration, Instant};

use super::policy::{TimeoutContext, TimeoutDecision, TimeoutPolicy};
use super::segmenter::LineSegmenter;
use super::sender::{PacedSender, PacingSettings, TransferOutcome};
use crate::error::{Error, Result};
use crate::session::Transport;

/// Options for one bulk transfer
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub pacing: PacingSettings,
    /// Drop the empty segment produced by a final line terminator
    pub skip_trailing_empty: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            pacing: PacingSettings::default(),
            skip_trailing_empty: true,
        }
    }
}

/// Summary of a bulk transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    /// Lines the transfer intended to send
    pub total_lines: usize,
    /// Lines acknowledged by the remote
    pub confirmed: usize,
    /// 1-based numbers of lines that timed out but were skipped past
    pub timed_out: Vec<usize>,
    /// The line the transfer stopped at, if the policy aborted
    pub aborted_at: Option<usize>,
    /// Text of the line the transfer stopped at
    pub failing_line: Option<String>,
    /// Acknowledgment bound each line was held to
    pub ack_timeout: Duration,
    pub elapsed: Duration,
}

impl TransferReport {
    /// Every line was sent and acknowledged
    pub fn is_complete(&self) -> bool {
        self.aborted_at.is_none() && self.timed_out.is_empty()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_at.is_some()
    }

    /// `Error::TransferAborted`, caused by the line's `Error::AckTimeout`,
    /// when the policy stopped the transfer
    pub fn abort_error(&self) -> Option<Error> {
        let line_number = self.aborted_at?;
        Some(Error::TransferAborted {
            confirmed: self.confirmed,
            cause: Box::new(Error::AckTimeout {
                line_number,
                confirmed: self.confirmed,
                timeout: self.ack_timeout,
            }),
        })
    }
}

/// Send `text` line by line, waiting for each line's acknowledgment
pub async fn transfer_text(
    transport: &mut dyn Transport,
    text: &str,
    options: &TransferOptions,
    policy: &mut dyn TimeoutPolicy,
) -> Result<TransferReport> {
    let segmenter = LineSegmenter::new(text);
    let mut total_lines = segmenter.line_count();
    if options.skip_trailing_empty && total_lines > 1 && segmenter.lines().last() == Some("") {
        total_lines -= 1;
    }
    info!(
        "Sending {} lines ({} line endings) with echo flow control",
        total_lines,
        segmenter.ending()
    );

    let started = Instant::now();
    let mut sender = PacedSender::new(options.pacing.clone());
    let mut report = TransferReport {
        total_lines,
        confirmed: 0,
        timed_out: Vec::new(),
        aborted_at: None,
        failing_line: None,
        ack_timeout: options.pacing.ack_timeout,
        elapsed: Duration::ZERO,
    };

    for (index, line) in segmenter.lines().take(total_lines).enumerate() {
        let line_number = index + 1;
        match sender.send_line(transport, line).await? {
            TransferOutcome::Confirmed => {}
            TransferOutcome::TimedOut => {
                let ctx = TimeoutContext {
                    line_number,
                    line,
                    confirmed: sender.confirmed(),
                    timeout: options.pacing.ack_timeout,
                };
                match policy.on_timeout(&ctx) {
                    TimeoutDecision::Continue => report.timed_out.push(line_number),
                    TimeoutDecision::Abort => {
                        report.aborted_at = Some(line_number);
                        report.failing_line = Some(line.to_string());
                        break;
                    }
                }
            }
        }
    }

    report.confirmed = sender.confirmed();
    report.elapsed = started.elapsed();
    if let Some(err) = report.abort_error() {
        warn!("{}", err);
    } else {
        info!(
            "{} of {} lines confirmed in {:.3}s",
            report.confirmed,
            report.total_lines,
            report.elapsed.as_secs_f64()
        );
    }
    Ok(report)
}
