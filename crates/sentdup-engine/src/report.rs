use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::Level;

/// Per-pass output context with three independent sinks: console progress filtered by a
/// level threshold, an append-mode log file, and an in-memory report buffer.
pub struct Reporter {
    progress: Box<dyn Write + Send>,
    threshold: Level,
    log: Option<(PathBuf, File)>,
    report: String,
}

impl Reporter {
    pub fn new(progress: impl Write + Send + 'static, threshold: Level) -> Self {
        Self {
            progress: Box::new(progress),
            threshold,
            log: None,
            report: String::new(),
        }
    }

    pub fn stdout(threshold: Level) -> Self {
        Self::new(io::stdout(), threshold)
    }

    /// Discards progress output; the report buffer still fills.
    pub fn silent() -> Self {
        Self::new(io::sink(), Level::ERROR)
    }

    /// Opens (or creates) `path` for appending. Parent directories are created.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.log = Some((path, file));
        Ok(self)
    }

    pub fn default_log_name(at: &DateTime<Utc>) -> String {
        format!("dedup-{}.log", at.format("%Y%m%d-%H%M%S"))
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Level) {
        self.threshold = threshold;
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(|(path, _)| path.as_path())
    }

    /// Writes to the progress sink when `level` is at or above the threshold's severity.
    pub fn progress(&mut self, level: Level, message: impl Display) -> io::Result<()> {
        if level <= self.threshold {
            writeln!(self.progress, "{message}")?;
        }
        Ok(())
    }

    pub fn info(&mut self, message: impl Display) -> io::Result<()> {
        self.progress(Level::INFO, message)
    }

    pub fn debug(&mut self, message: impl Display) -> io::Result<()> {
        self.progress(Level::DEBUG, message)
    }

    /// Appends a timestamped line to the log file, if one is open.
    pub fn log(&mut self, message: impl Display) -> io::Result<()> {
        if let Some((_, file)) = self.log.as_mut() {
            writeln!(file, "[{}] {message}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
        }
        Ok(())
    }

    /// Adds one line to the final report.
    pub fn report(&mut self, line: impl Display) {
        self.report.push_str(&line.to_string());
        self.report.push('\n');
    }

    pub fn report_text(&self) -> &str {
        &self.report
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.progress.flush()?;
        if let Some((_, file)) = self.log.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}
