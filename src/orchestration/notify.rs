//! Failure notifications
//!
//! A [`FailureNotice`] names the failed flow run and the error that ended
//! it. Delivery goes through a [`Notifier`]; the crate ships a log-based
//! and a file-based one.

use crate::error::{ForestError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Notice sent when a flow run fails for good
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureNotice {
    /// Name of the failed flow run
    pub flow_run_name: String,
    /// Display form of the causing error
    pub error: String,
    /// Attempts made before giving up
    pub attempts: u32,
    /// When the flow gave up
    pub failed_at: DateTime<Utc>,
}

impl FailureNotice {
    pub fn new(flow_run_name: impl Into<String>, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            flow_run_name: flow_run_name.into(),
            error: error.into(),
            attempts,
            failed_at: Utc::now(),
        }
    }

    /// One-line subject
    pub fn subject(&self) -> String {
        format!("Flow run '{}' failed", self.flow_run_name)
    }

    /// Human-readable body
    pub fn message(&self) -> String {
        format!("Flow run '{}' failed due to {}.", self.flow_run_name, self.error)
    }
}

/// Delivers failure notices through some external channel
pub trait Notifier {
    fn notify(&self, notice: &FailureNotice) -> Result<()>;
}

/// Emits the notice as an error-level tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &FailureNotice) -> Result<()> {
        tracing::error!(
            flow_run = %notice.flow_run_name,
            attempts = notice.attempts,
            subject = %notice.subject(),
            "{}",
            notice.message()
        );
        Ok(())
    }
}

/// Appends each notice as one JSON line to a file
#[derive(Debug)]
pub struct FileNotifier {
    path: PathBuf,
    // Serializes appends from concurrent flows sharing one notifier
    write_lock: Mutex<()>,
}

impl FileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl Notifier for FileNotifier {
    fn notify(&self, notice: &FailureNotice) -> Result<()> {
        let line = serde_json::json!({
            "subject": notice.subject(),
            "message": notice.message(),
            "notice": notice,
        });

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ForestError::NotificationError(format!("cannot open {}: {}", self.path.display(), e))
            })?;
        writeln!(file, "{}", line)
            .map_err(|e| ForestError::NotificationError(format!("cannot write notice: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_notice_wording() {
        let notice = FailureNotice::new("train-1a2b3c4d", "division by zero", 1);
        assert_eq!(notice.subject(), "Flow run 'train-1a2b3c4d' failed");
        assert_eq!(notice.message(), "Flow run 'train-1a2b3c4d' failed due to division by zero.");
    }

    #[test]
    fn test_log_notifier() {
        let notice = FailureNotice::new("run", "boom", 2);
        assert!(LogNotifier.notify(&notice).is_ok());
    }

    #[test]
    fn test_file_notifier_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notices.jsonl");
        let notifier = FileNotifier::new(&path);

        notifier.notify(&FailureNotice::new("a", "first", 1)).unwrap();
        notifier.notify(&FailureNotice::new("b", "second", 3)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["subject"], "Flow run 'a' failed");
        assert_eq!(lines[1]["notice"]["attempts"], 3);
    }

    #[test]
    fn test_file_notifier_bad_path() {
        let dir = TempDir::new().unwrap();
        let notifier = FileNotifier::new(dir.path().join("missing").join("notices.jsonl"));

        let err = notifier.notify(&FailureNotice::new("a", "x", 1)).unwrap_err();
        assert!(matches!(err, ForestError::NotificationError(_)));
    }
}
