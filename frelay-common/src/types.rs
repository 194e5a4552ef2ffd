//! Common types used across frelay components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, devices.
    Other,
}

/// Snapshot of one entry from a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

impl RemoteEntry {
    /// Convenience constructor for a regular file entry.
    pub fn file(name: impl Into<String>, size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            modified_at,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Result of a remote `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

/// Credentials for the remote file store.
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &crate::util::mask_secret(&self.password))
            .finish()
    }
}

/// State reported by the downstream sync job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobState {
    Pending,
    Queued,
    Running,
    Querying,
    Processing,
    Reporting,
    Succeeded,
    Failed,
    Cancelled,
    /// Status string this client does not recognise; polled like a running job.
    Unknown(String),
}

impl SyncJobState {
    /// Map a raw API status string onto a state.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "queued" => Self::Queued,
            "running" | "in_progress" => Self::Running,
            "querying" => Self::Querying,
            "processing" => Self::Processing,
            "reporting" => Self::Reporting,
            "success" | "succeeded" | "completed" => Self::Succeeded,
            "failed" | "failure" | "error" => Self::Failed,
            "cancelled" | "canceled" | "aborted" => Self::Cancelled,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Whether no further transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for SyncJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Querying => write!(f, "querying"),
            Self::Processing => write!(f, "processing"),
            Self::Reporting => write!(f, "reporting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

/// Outcome of processing one selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub filename: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl FileOutcome {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            succeeded: true,
            error: None,
            error_code: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: &crate::RelayError) -> Self {
        Self {
            filename: filename.into(),
            succeeded: false,
            error: Some(error.to_string()),
            error_code: Some(error.code().code_string()),
        }
    }
}

/// Result of one relay run, handed back to the entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial_failure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_filenames: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<FileOutcome>,
    /// Run-level error detail when the run aborted before processing files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// Aggregate per-file outcomes into a run result.
    ///
    /// No successes means total failure; a mix means success with
    /// `partial_failure` set.
    pub fn from_outcomes(run_id: impl Into<String>, outcomes: Vec<FileOutcome>) -> Self {
        let failed_filenames: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.filename.clone())
            .collect();
        let succeeded = outcomes.len() - failed_filenames.len();

        let (success, partial_failure, message) = if failed_filenames.is_empty() {
            (
                true,
                false,
                format!("Sync completed successfully for {} file(s)", succeeded),
            )
        } else if succeeded == 0 {
            (
                false,
                false,
                format!("Sync failed for all {} file(s)", failed_filenames.len()),
            )
        } else {
            (
                true,
                true,
                format!(
                    "Sync completed with {} failed file(s): {}",
                    failed_filenames.len(),
                    failed_filenames.join(", ")
                ),
            )
        };

        Self {
            run_id: run_id.into(),
            success,
            message,
            partial_failure,
            failed_filenames,
            outcomes,
            error: None,
        }
    }

    /// A run that aborted before or outside the per-file loop.
    pub fn aborted(run_id: impl Into<String>, error: &crate::RelayError) -> Self {
        Self {
            run_id: run_id.into(),
            success: false,
            message: "Sync failed".to_string(),
            partial_failure: false,
            failed_filenames: Vec::new(),
            outcomes: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelayError;

    fn failed(name: &str) -> FileOutcome {
        FileOutcome::failure(
            name,
            &RelayError::EmptyFile {
                path: format!("/in/{}", name),
            },
        )
    }

    #[test]
    fn test_sync_job_state_parse() {
        assert_eq!(SyncJobState::parse("success"), SyncJobState::Succeeded);
        assert_eq!(SyncJobState::parse("FAILED"), SyncJobState::Failed);
        assert_eq!(SyncJobState::parse("canceled"), SyncJobState::Cancelled);
        assert_eq!(SyncJobState::parse("querying"), SyncJobState::Querying);
        assert_eq!(
            SyncJobState::parse("warming_up"),
            SyncJobState::Unknown("warming_up".to_string())
        );
    }

    #[test]
    fn test_sync_job_state_terminal() {
        assert!(SyncJobState::Succeeded.is_terminal());
        assert!(SyncJobState::Failed.is_terminal());
        assert!(SyncJobState::Cancelled.is_terminal());
        assert!(!SyncJobState::Processing.is_terminal());
        assert!(!SyncJobState::Unknown("x".to_string()).is_terminal());
    }

    #[test]
    fn test_run_result_all_succeeded() {
        let result = RunResult::from_outcomes(
            "run-1",
            vec![FileOutcome::success("a"), FileOutcome::success("b")],
        );
        assert!(result.success);
        assert!(!result.partial_failure);
        assert!(result.failed_filenames.is_empty());
    }

    #[test]
    fn test_run_result_partial() {
        let result = RunResult::from_outcomes(
            "run-1",
            vec![FileOutcome::success("a"), failed("b"), FileOutcome::success("c")],
        );
        assert!(result.success);
        assert!(result.partial_failure);
        assert_eq!(result.failed_filenames, vec!["b"]);
        assert!(result.message.contains("b"));
    }

    #[test]
    fn test_run_result_total_failure() {
        let result = RunResult::from_outcomes("run-1", vec![failed("a"), failed("b")]);
        assert!(!result.success);
        assert!(!result.partial_failure);
        assert_eq!(result.failed_filenames, vec!["a", "b"]);
    }

    #[test]
    fn test_run_result_serializes_camel_case_and_skips_empty() {
        let result = RunResult::from_outcomes("run-1", vec![FileOutcome::success("a")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["runId"], "run-1");
        assert!(json.get("partialFailure").is_none());
        assert!(json.get("failedFilenames").is_none());

        let partial = RunResult::from_outcomes("run-2", vec![FileOutcome::success("a"), failed("b")]);
        let json = serde_json::to_value(&partial).unwrap();
        assert_eq!(json["partialFailure"], true);
        assert_eq!(json["failedFilenames"][0], "b");
        assert_eq!(json["outcomes"][1]["errorCode"], "FRELAY-E201");
    }

    #[test]
    fn test_credentials_debug_masks_password() {
        let creds = Credentials {
            host: "sftp.example.com".to_string(),
            port: 22,
            username: "relay".to_string(),
            password: "hunter22".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("sftp.example.com"));
        assert!(!debug.contains("hunter22"));
    }
}
