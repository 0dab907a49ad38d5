//! Small file-backed state shared between the check loop and the health
//! endpoint: last success time and the consecutive failure count.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::StatePaths;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Liveness verdict derived from the last success time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy { age: Duration },
    /// Too long since the last success; `age` is `None` when there never was one.
    Stale { age: Option<Duration> },
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

/// Reads and writes the monitor's state files.
#[derive(Debug, Clone)]
pub struct StateStore {
    paths: StatePaths,
}

impl StateStore {
    pub fn new(paths: StatePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Records `now` as the time of the last successful check.
    pub fn mark_success(&self, now: DateTime<Local>) -> Result<(), StateError> {
        write(&self.paths.status_file, &now.to_rfc3339())
    }

    /// Time of the last successful check, if one was recorded and is readable.
    pub fn last_success(&self) -> Option<DateTime<Local>> {
        let raw = fs::read_to_string(&self.paths.status_file).ok()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    }

    /// Elapsed time since the last success. `None` means never (or unreadable),
    /// which callers treat as infinitely stale.
    pub fn since_last_success(&self, now: DateTime<Local>) -> Option<Duration> {
        let last = self.last_success()?;
        Some((now - last).to_std().unwrap_or(Duration::ZERO))
    }

    /// Healthy when the last success is no older than `stale_after`.
    pub fn health(&self, now: DateTime<Local>, stale_after: Duration) -> Health {
        match self.since_last_success(now) {
            Some(age) if age <= stale_after => Health::Healthy { age },
            age => Health::Stale { age },
        }
    }

    /// Consecutive failures so far; 0 when the file is missing or garbled.
    pub fn failure_count(&self) -> u32 {
        fs::read_to_string(&self.paths.failure_file)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn set_failure_count(&self, count: u32) -> Result<(), StateError> {
        write(&self.paths.failure_file, &count.to_string())
    }

    /// Whether the one-time startup alert has already gone out.
    pub fn is_started(&self) -> bool {
        self.paths.started_file.exists()
    }

    pub fn mark_started(&self) -> Result<(), StateError> {
        write(&self.paths.started_file, "done")
    }

    /// Saves a document that could not be parsed, for later inspection.
    pub fn capture_document(&self, html: &str) -> Result<(), StateError> {
        write(&self.paths.capture_file, html)
    }
}

fn write(path: &Path, contents: &str) -> Result<(), StateError> {
    fs::write(path, contents).map_err(|source| StateError::Write {
        path: path.display().to_string(),
        source,
    })
}
