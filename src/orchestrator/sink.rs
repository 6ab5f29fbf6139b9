//! Result Sinks
//!
//! Where command results and the final run report go. The orchestrator
//! treats any sink failure as fatal to the run.

use std::fs;
use std::path::{Path, PathBuf};

use super::report::RunReport;
use crate::error::{Error, Result};
use crate::models::CommandResult;

/// Line separator used in result artifacts
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// File name of the JSON run report inside the output directory
pub const SUMMARY_FILE: &str = "summary.json";

/// Destination for command results
pub trait ResultSink: Send {
    /// Store one command result
    fn persist(&mut self, result: &CommandResult) -> Result<()>;

    /// Store the final report once all targets are processed
    fn finish(&mut self, report: &RunReport) -> Result<()>;
}

/// Artifact file name for the command at `ordinal_tag`
pub fn artifact_name(ordinal_tag: &str) -> String {
    format!("Command_{}_Results.txt", ordinal_tag)
}

/// Writes `<root>/<target-slug>/Command_NN_Results.txt` per result and
/// `<root>/summary.json` at the end
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the artifact for `result` is written to
    pub fn artifact_path(&self, result: &CommandResult) -> PathBuf {
        self.root
            .join(result.target.slug())
            .join(artifact_name(&result.ordinal_tag()))
    }

    fn write(path: &Path, content: &str) -> Result<()> {
        let failed = |e: std::io::Error| Error::PersistenceFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(failed)?;
        }
        fs::write(path, content).map_err(failed)
    }
}

impl ResultSink for FileSink {
    fn persist(&mut self, result: &CommandResult) -> Result<()> {
        let path = self.artifact_path(result);
        let content = format!(
            "Results of command: {}{sep}{}{sep}",
            result.command,
            result.output,
            sep = LINE_SEPARATOR
        );
        Self::write(&path, &content)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        let path = self.root.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(report)?;
        Self::write(&path, &json)?;
        info!("Run summary written to {}", path.display());
        Ok(())
    }
}

/// Keeps everything in memory; for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub results: Vec<CommandResult>,
    pub report: Option<RunReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn persist(&mut self, result: &CommandResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        self.report = Some(report.clone());
        Ok(())
    }
}
