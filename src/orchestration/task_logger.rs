//! # Task Logger
//!
//! Append-only log of one task execution. Lines accumulate in memory and, when
//! the logger is bound to a file, are also written to that file. Quiet lines
//! (per-file messages during extraction and packaging) go to the file only.
//!
//! A file that cannot be opened or written does not fail the task: the logger
//! drops the sink, records a warning line and keeps working in memory.

use super::types::TaskResult;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct TaskLogger {
    log: Vec<String>,
    err: Vec<String>,
    sink: Option<BufWriter<File>>,
    sink_path: Option<PathBuf>,
    degraded: bool,
}

impl TaskLogger {
    /// Logger without a file sink
    pub fn in_memory() -> Self {
        Self {
            log: Vec::new(),
            err: Vec::new(),
            sink: None,
            sink_path: None,
            degraded: false,
        }
    }

    /// Logger appending to `path`; falls back to memory if the file cannot be opened
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut logger = Self::in_memory();
        logger.sink_path = Some(path.to_path_buf());

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => logger.sink = Some(BufWriter::new(file)),
            Err(e) => logger.degrade(format!(
                "Unable to open log file {}: {e}; logging in memory only",
                path.display()
            )),
        }
        logger
    }

    /// Append an info line shown to the user and persisted
    pub fn add_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "task_logger", "{message}");
        self.write_line("INFO", &message);
        self.log.push(message);
    }

    /// Append an info line to the persisted log only
    pub fn add_quiet_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "task_logger", "{message}");
        self.write_line("INFO", &message);
    }

    /// Append an error line
    pub fn add_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "task_logger", "{message}");
        self.write_line("ERROR", &message);
        self.err.push(message);
    }

    /// Merge lines reported by a collaborator (validator, uploader)
    pub fn append(&mut self, log: &[String], err: &[String]) {
        for line in log {
            self.add_info(line.clone());
        }
        for line in err {
            self.add_error(line.clone());
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.err.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn err(&self) -> &[String] {
        &self.err
    }

    /// File the logger was bound to, if any
    pub fn sink_path(&self) -> Option<&Path> {
        self.sink_path.as_deref()
    }

    /// Flush and release the file sink; later lines stay in memory. Idempotent.
    pub fn close_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                self.degrade(format!("Unable to flush task log: {e}"));
            }
        }
    }

    /// Close the sink and produce the task result
    ///
    /// Consumes the logger, so a second finalization cannot happen.
    pub fn finalize(mut self) -> TaskResult {
        self.close_sink();
        TaskResult::new(std::mem::take(&mut self.log), std::mem::take(&mut self.err))
    }

    fn write_line(&mut self, level: &str, message: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let line = format!("{} {level} {message}", Utc::now().to_rfc3339());
        if let Err(e) = writeln!(sink, "{line}") {
            self.sink = None;
            self.degrade(format!("Unable to write task log: {e}; logging in memory only"));
        }
    }

    fn degrade(&mut self, warning: String) {
        warn!(target: "task_logger", "{warning}");
        self.degraded = true;
        self.log.push(format!("WARNING: {warning}"));
    }
}
