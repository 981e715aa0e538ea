//! Append-only run journal: one error log and one info log per target.
//!
//! Journal writes never fail the run. A line that cannot be written is
//! reported on the console and dropped.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

use crate::config::GeneralConfig;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct RunLog {
    error_log: PathBuf,
    info_log: PathBuf,
}

impl RunLog {
    pub fn new(error_log: PathBuf, info_log: PathBuf) -> Self {
        Self {
            error_log,
            info_log,
        }
    }

    /// Journal files live directly in the target's base directory.
    pub fn in_dir(dir: &Path, general: &GeneralConfig) -> Self {
        Self::new(dir.join(&general.log_file), dir.join(&general.info_log))
    }

    pub fn error_log(&self) -> &Path {
        &self.error_log
    }

    pub fn info_log(&self) -> &Path {
        &self.info_log
    }

    /// `2026-01-01 12:00:00 - Error during <phase>: <message>`
    pub fn error(&self, phase: &str, message: &str) {
        let line = format!("{} - Error during {phase}: {message}", timestamp());
        if let Err(e) = append_line(&self.error_log, &line) {
            warn!("Could not write to {}: {e}", self.error_log.display());
        }
    }

    /// `2026-01-01 12:00:00 - INFO - <message>`
    pub fn info(&self, message: &str) {
        let line = format!("{} - INFO - {message}", timestamp());
        if let Err(e) = append_line(&self.info_log, &line) {
            warn!("Could not write to {}: {e}", self.info_log.display());
        }
    }
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
