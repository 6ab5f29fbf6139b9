//! Run Report
//!
//! Aggregates what a batch run produced: how many results were persisted
//! and the one error each failed target contributed.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ErrorRecord;

/// Message shown when every target succeeded
pub const SUCCESS_MESSAGE: &str = "Tasks completed.  No Errors were detected.";

/// Heading of the consolidated error listing
pub const FAILURE_HEADING: &str = "Tasks completed.  The following errors occurred:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub targets_processed: usize,
    /// Command results persisted across all targets
    pub results: usize,
    pub errors: Vec<ErrorRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Local::now(),
            finished_at: None,
            targets_processed: 0,
            results: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, record: ErrorRecord) {
        self.errors.push(record);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The success message, or the heading followed by one line per error
    pub fn summary(&self) -> String {
        if self.is_success() {
            return SUCCESS_MESSAGE.to_string();
        }
        let mut summary = FAILURE_HEADING.to_string();
        for record in &self.errors {
            summary.push_str("\n*** ");
            summary.push_str(&record.message);
        }
        summary
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
