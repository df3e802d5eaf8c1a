//! Run logs: one JSON audit record per job invocation.
//!
//! A [`RunLog`] is created when a job starts, threaded through the job by
//! `&mut`, and persisted exactly once at the end. Job-specific counters live
//! in the generic `counts` value and are flattened into the top-level object:
//!
//! ```json
//! {
//!   "startTime": "2026-10-16T10:51:00+02:00",
//!   "endTime": "2026-10-16T10:51:04+02:00",
//!   "status": "COMPLETED_WITH_ERRORS",
//!   "albums": 2,
//!   "totalFiles": 7,
//!   "errors": ["doors/broken.jpg: Failed to decode ..."]
//! }
//! ```
//!
//! ## Status
//!
//! | Status | Meaning |
//! |---|---|
//! | `SUCCESS` | finished without errors |
//! | `COMPLETED_WITH_ERRORS` | finished, some items failed |
//! | `FAILED` | aborted (missing input) or could not write its artifacts |
//! | `NO_CHANGES` | nothing to do |
//!
//! `FAILED` and `NO_CHANGES` are set explicitly and survive [`RunLog::finish`];
//! the other two are derived from the error list.

use crate::naming::{iso_timestamp, now, run_stamp};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum RunLogError {
    #[error("cannot write run log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode run log: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    CompletedWithErrors,
    Failed,
    NoChanges,
}

impl RunStatus {
    /// Whether the process should exit non-zero.
    pub fn is_failure(self) -> bool {
        self == RunStatus::Failed
    }

    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            RunStatus::Failed => "FAILED",
            RunStatus::NoChanges => "NO_CHANGES",
        }
    }
}

/// Accumulated record of one job run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLog<C> {
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: RunStatus,
    #[serde(flatten)]
    pub counts: C,
    pub errors: Vec<String>,
    #[serde(skip)]
    stamp: String,
}

impl<C> RunLog<C> {
    /// Start a log at the current local time.
    pub fn start(counts: C) -> Self {
        Self::started_at(&now(), counts)
    }

    pub fn started_at(at: &DateTime<Local>, counts: C) -> Self {
        Self {
            start_time: iso_timestamp(at),
            end_time: None,
            status: RunStatus::Success,
            counts,
            errors: Vec::new(),
            stamp: run_stamp(at),
        }
    }

    /// File-name stamp of the run start, shared by all artifacts of the run.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Record a non-fatal item error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.errors.push(message);
    }

    /// Record a fatal error; the run ends as `FAILED`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error(message);
        self.status = RunStatus::Failed;
    }

    /// Mark the run as having had nothing to do.
    pub fn no_changes(&mut self) {
        if self.status != RunStatus::Failed {
            self.status = RunStatus::NoChanges;
        }
    }

    /// Stamp the end time and settle the final status.
    pub fn finish(&mut self) {
        self.end_time = Some(iso_timestamp(&now()));
        self.status = match self.status {
            RunStatus::Failed => RunStatus::Failed,
            RunStatus::NoChanges if self.errors.is_empty() => RunStatus::NoChanges,
            _ if self.errors.is_empty() => RunStatus::Success,
            _ => RunStatus::CompletedWithErrors,
        };
    }
}

impl<C: Serialize> RunLog<C> {
    /// Write the log to `<dir>/<prefix>_<stamp>.json`, creating `dir` if needed.
    ///
    /// A log from an earlier run in the same second is kept; this one gets a
    /// numeric suffix instead (see [`create_unique`]).
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<PathBuf, RunLogError> {
        let stem = format!("{}_{}", prefix, self.stamp);
        std::fs::create_dir_all(dir).map_err(|source| RunLogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let json = serde_json::to_string_pretty(self)?;
        let (path, mut file) =
            create_unique(dir, &stem, "json").map_err(|source| RunLogError::Io {
                path: dir.join(format!("{}.json", stem)),
                source,
            })?;
        file.write_all(json.as_bytes())
            .map_err(|source| RunLogError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Create `<dir>/<stem>.<ext>` without overwriting anything.
///
/// If the name is taken, `<stem>_2.<ext>`, `<stem>_3.<ext>`, ... are tried
/// in turn.
pub fn create_unique(dir: &Path, stem: &str, ext: &str) -> io::Result<(PathBuf, File)> {
    let mut n = 1u32;
    loop {
        let name = if n == 1 {
            format!("{}.{}", stem, ext)
        } else {
            format!("{}_{}.{}", stem, n, ext)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Counts {
        total_rows: usize,
    }

    fn fixed_start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 10, 51, 0).unwrap()
    }

    #[test]
    fn clean_run_is_success() {
        let mut log = RunLog::start(Counts::default());
        log.finish();
        assert_eq!(log.status, RunStatus::Success);
        assert!(log.end_time.is_some());
    }

    #[test]
    fn item_errors_complete_with_errors() {
        let mut log = RunLog::start(Counts::default());
        log.error("doors/a.jpg: broken");
        log.finish();
        assert_eq!(log.status, RunStatus::CompletedWithErrors);
        assert_eq!(log.errors, vec!["doors/a.jpg: broken"]);
    }

    #[test]
    fn failed_survives_finish() {
        let mut log = RunLog::start(Counts::default());
        log.fail("originals missing");
        log.no_changes();
        log.finish();
        assert_eq!(log.status, RunStatus::Failed);
        assert!(log.status.is_failure());
    }

    #[test]
    fn no_changes_survives_finish() {
        let mut log = RunLog::start(Counts::default());
        log.no_changes();
        log.finish();
        assert_eq!(log.status, RunStatus::NoChanges);
        assert!(!log.status.is_failure());
    }

    #[test]
    fn stamp_follows_start_time() {
        let log = RunLog::started_at(&fixed_start(), Counts::default());
        assert_eq!(log.stamp(), "2026-10-16_10_51_00");
        assert!(log.start_time.starts_with("2026-10-16T10:51:00"));
    }

    #[test]
    fn serializes_camel_case_with_flattened_counts() {
        let mut log = RunLog::started_at(&fixed_start(), Counts { total_rows: 3 });
        log.finish();

        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["totalRows"], 3);
        assert_eq!(value["status"], "SUCCESS");
        assert!(value["startTime"].is_string());
        assert!(value["endTime"].is_string());
        assert_eq!(value["errors"], serde_json::json!([]));
        assert!(value.get("stamp").is_none());
    }

    #[test]
    fn save_writes_prefixed_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs/database-sync");
        let mut log = RunLog::started_at(&fixed_start(), Counts::default());
        log.finish();

        let path = log.save(&dir, "sync").unwrap();
        assert_eq!(path, dir.join("sync_2026-10-16_10_51_00.json"));

        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["status"], "SUCCESS");
    }

    #[test]
    fn save_in_same_second_keeps_earlier_log() {
        let tmp = TempDir::new().unwrap();
        let mut first = RunLog::started_at(&fixed_start(), Counts { total_rows: 1 });
        first.finish();
        let mut second = RunLog::started_at(&fixed_start(), Counts { total_rows: 2 });
        second.finish();

        let first_path = first.save(tmp.path(), "sync").unwrap();
        let second_path = second.save(tmp.path(), "sync").unwrap();

        assert_eq!(first_path, tmp.path().join("sync_2026-10-16_10_51_00.json"));
        assert_eq!(second_path, tmp.path().join("sync_2026-10-16_10_51_00_2.json"));
        let first_back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&first_path).unwrap()).unwrap();
        assert_eq!(first_back["totalRows"], 1);
    }

    #[test]
    fn create_unique_counts_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.sql"), "old").unwrap();
        std::fs::write(tmp.path().join("a_2.sql"), "old").unwrap();

        let (path, _) = create_unique(tmp.path(), "a", "sql").unwrap();

        assert_eq!(path, tmp.path().join("a_3.sql"));
        assert_eq!(std::fs::read_to_string(tmp.path().join("a.sql")).unwrap(), "old");
    }

    #[test]
    fn status_labels_match_serialization() {
        for status in [
            RunStatus::Success,
            RunStatus::CompletedWithErrors,
            RunStatus::Failed,
            RunStatus::NoChanges,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
        }
    }
}
