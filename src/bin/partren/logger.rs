use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use part_rename::parts::FileOutcome;
use part_rename::{BatchReport, ReplayReport, Rule};

use crate::config::Config;

/// Simple file logger for rename operations with buffered writes
pub struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/part-rename/partren_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let log_dir = part_rename::config::LOG_DIR
            .as_deref()
            .context("Failed to get home directory")?;
        Self::in_directory(log_dir)
    }

    /// Create a new file logger in the given directory.
    pub(crate) fn in_directory(log_dir: &Path) -> Result<Self> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let path = log_dir.join(format!("partren_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log when starting the program
    pub(crate) fn log_init(&mut self, root: &Path, config: &Config) {
        let _ = writeln!(self.writer, "[{}] INIT \"{}\"", Self::timestamp(), root.display());
        if !config.filter.include.is_empty() {
            let _ = writeln!(self.writer, "  include: {:?}", config.filter.include);
        }
        if !config.filter.exclude.is_empty() {
            let _ = writeln!(self.writer, "  exclude: {:?}", config.filter.exclude);
        }
        let _ = writeln!(self.writer, "  overwrite: {}", config.overwrite);
        let _ = writeln!(self.writer, "  dryrun: {}", config.dryrun);
        let _ = self.writer.flush();
    }

    /// Log a rule replay over the file list
    pub(crate) fn log_replay(&mut self, template: Option<&str>, rule: &Rule, report: &ReplayReport) {
        let _ = writeln!(
            self.writer,
            "[{}] RULE    template: {} | positions: {:?} | custom: {:?}",
            Self::timestamp(),
            template.unwrap_or("-"),
            rule.indices(),
            rule.literals()
        );
        for skipped in &report.skipped_files {
            let _ = writeln!(self.writer, "  skipped: {skipped}");
        }
        let _ = writeln!(
            self.writer,
            "  applied: {} | skipped: {}",
            report.applied, report.skipped
        );
        let _ = self.writer.flush();
    }

    /// Log every file of a finished copy or move batch
    pub(crate) fn log_batch(&mut self, report: &BatchReport) {
        let operation = report.operation.verb().to_uppercase();
        for outcome in &report.outcomes {
            let _ = match outcome {
                FileOutcome::Done { source, target } => writeln!(
                    self.writer,
                    "[{}] {operation:<7} \"{}\" -> \"{}\"",
                    Self::timestamp(),
                    source.display(),
                    target.display()
                ),
                FileOutcome::Declined { source, target } => writeln!(
                    self.writer,
                    "[{}] KEEP    \"{}\" -> \"{}\" | target exists",
                    Self::timestamp(),
                    source.display(),
                    target.display()
                ),
                FileOutcome::Failed { source, target, error } => writeln!(
                    self.writer,
                    "[{}] ERROR   \"{}\" -> \"{}\" | {error}",
                    Self::timestamp(),
                    source.display(),
                    target.display()
                ),
            };
        }
        let _ = writeln!(
            self.writer,
            "[{}] STATISTICS {operation} succeeded: {} | failed: {} | kept existing: {}",
            Self::timestamp(),
            report.succeeded,
            report.failed(),
            report.declined
        );
        if let Some(error) = &report.rescan_error {
            let _ = writeln!(self.writer, "  rescan failed: {error}");
        }
        let _ = self.writer.flush();
    }
}
