//! Outcome sinks: where scan records go.
//!
//! The scanner classifies; a sink persists. [`LogFileSink`] reproduces the
//! three plain-text logs (added files, missing directories, mismatches),
//! one line per event. [`MemorySink`] collects outcomes for assertions.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Result;

use super::ScanOutcome;

/// Consumer of classified scan outcomes.
pub trait ReportSink {
    fn record(&mut self, outcome: &ScanOutcome) -> Result<()>;
}

/// Newline-delimited log files under a dedicated directory.
///
/// File names carry a run stamp so successive runs never clobber each
/// other. Buffers are flushed on [`finish`](Self::finish) and, best-effort,
/// on drop.
#[derive(Debug)]
pub struct LogFileSink {
    added: BufWriter<File>,
    missing: BufWriter<File>,
    mismatched: BufWriter<File>,
    finished: bool,
}

impl LogFileSink {
    /// Open the three logs under `log_dir`, stamped with the current UTC
    /// time.
    pub fn for_run(log_dir: &Path) -> Result<Self> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        Self::create(log_dir, &stamp)
    }

    /// Open the three logs under `log_dir` with an explicit run label.
    pub fn create(log_dir: &Path, run_label: &str) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let open = |stem: &str| -> Result<BufWriter<File>> {
            let path = log_dir.join(format!("{stem}_{run_label}.log"));
            Ok(BufWriter::new(File::create(path)?))
        };
        Ok(Self {
            added: open("added_files")?,
            missing: open("missing_directories")?,
            mismatched: open("tile_or_level_not_found")?,
            finished: false,
        })
    }

    /// Flush and close all three logs.
    pub fn finish(mut self) -> Result<()> {
        self.flush_all()?;
        self.finished = true;
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        self.added.flush()?;
        self.missing.flush()?;
        self.mismatched.flush()?;
        Ok(())
    }
}

impl ReportSink for LogFileSink {
    fn record(&mut self, outcome: &ScanOutcome) -> Result<()> {
        match outcome {
            ScanOutcome::Added { product, .. } | ScanOutcome::AlreadyPresent { product, .. } => {
                writeln!(self.added, "{}", product.display())?;
            }
            ScanOutcome::MissingDirectory { directory } => {
                writeln!(self.missing, "{}", directory.display())?;
            }
            ScanOutcome::TileOrLevelMismatch { directory, .. } => {
                writeln!(self.mismatched, "{}", directory.display())?;
            }
            ScanOutcome::PatternMismatch { file, reason } => {
                writeln!(self.mismatched, "{}: {reason}", file.display())?;
            }
            ScanOutcome::AddFailed { product, reason } => {
                writeln!(self.mismatched, "{}: {reason}", product.display())?;
            }
        }
        Ok(())
    }
}

impl Drop for LogFileSink {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.flush_all();
        }
    }
}

/// In-memory sink for tests and callers that post-process outcomes.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub outcomes: Vec<ScanOutcome>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every added product, in scan order.
    #[must_use]
    pub fn added(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ScanOutcome::Added { product, .. } => Some(product),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn record(&mut self, outcome: &ScanOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }
}
