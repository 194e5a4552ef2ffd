//! Error types for the relay.
//!
//! [`RelayError`] is the single error type flowing out of selection, the
//! transfer pipeline and the sync protocol. Each variant maps onto an
//! [`ErrorCode`] from the [`catalog`].

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};

use crate::config::ConfigError;
use crate::transport::TransportError;
use crate::types::SyncJobState;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while relaying files and driving the downstream sync.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "No files found matching patterns [{}] for today or yesterday (date-matched candidates: [{}])",
        .patterns.join(", "),
        .candidates.join(", ")
    )]
    NoMatchingFiles {
        candidates: Vec<String>,
        patterns: Vec<String>,
    },

    #[error("Source file does not exist: {path}")]
    SourceNotFound { path: String },

    #[error("Source file is empty: {path}")]
    EmptyFile { path: String },

    #[error(
        "Source file is stale: {path} was last modified at {modified_at} ({age_hours:.1}h ago, limit {max_age_hours}h)"
    )]
    StaleFile {
        path: String,
        modified_at: DateTime<Utc>,
        age_hours: f64,
        max_age_hours: u32,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to trigger sync {sync_id}: {}", describe_response(.status, .body))]
    TriggerFailed {
        sync_id: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Failed to check status of sync {sync_id}: {}", describe_response(.status, .body))]
    StatusCheckFailed {
        sync_id: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Sync {sync_id} finished with state {state}: {detail}")]
    SyncJobFailed {
        sync_id: String,
        state: SyncJobState,
        detail: String,
    },

    #[error("Sync {sync_id} did not finish after {attempts} status checks (last state: {last_state})")]
    SyncTimeout {
        sync_id: String,
        attempts: u32,
        last_state: SyncJobState,
    },

    #[error("Error closing SFTP connection: {0}")]
    TransportClose(TransportError),
}

pub(crate) fn describe_response(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) if body.is_empty() => format!("HTTP {}", code),
        Some(code) => format!("HTTP {}: {}", code, body),
        None => body.to_string(),
    }
}

impl RelayError {
    /// Catalog code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(err) => err.code(),
            Self::NoMatchingFiles { .. } => ErrorCode::NoMatchingFiles,
            Self::SourceNotFound { .. } => ErrorCode::SourceNotFound,
            Self::EmptyFile { .. } => ErrorCode::EmptyFile,
            Self::StaleFile { .. } => ErrorCode::StaleFile,
            Self::Transport(err) => err.code(),
            Self::TriggerFailed { .. } => ErrorCode::SyncTriggerFailed,
            Self::StatusCheckFailed { .. } => ErrorCode::SyncStatusCheckFailed,
            Self::SyncJobFailed { .. } => ErrorCode::SyncJobFailed,
            Self::SyncTimeout { .. } => ErrorCode::SyncTimeout,
            Self::TransportClose(_) => ErrorCode::TransportClose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_files_lists_candidates() {
        let err = RelayError::NoMatchingFiles {
            candidates: vec!["other_10152026.csv".to_string()],
            patterns: vec!["current_month".to_string(), "prior_month".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("current_month, prior_month"));
        assert!(text.contains("other_10152026.csv"));
        assert_eq!(err.code(), ErrorCode::NoMatchingFiles);
    }

    #[test]
    fn test_trigger_failed_message_includes_status_and_body() {
        let err = RelayError::TriggerFailed {
            sync_id: "42".to_string(),
            status: Some(409),
            body: "sync already running".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to trigger sync 42: HTTP 409: sync already running"
        );
    }

    #[test]
    fn test_status_check_without_http_status() {
        let err = RelayError::StatusCheckFailed {
            sync_id: "42".to_string(),
            status: None,
            body: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to check status of sync 42: connection reset"
        );
    }

    #[test]
    fn test_sync_timeout_message() {
        let err = RelayError::SyncTimeout {
            sync_id: "42".to_string(),
            attempts: 30,
            last_state: SyncJobState::Processing,
        };
        assert!(err.to_string().contains("after 30 status checks"));
        assert!(err.to_string().contains("processing"));
        assert_eq!(err.code().code_string(), "FRELAY-E303");
    }

    #[test]
    fn test_transport_close_code() {
        let err = RelayError::TransportClose(TransportError::NotConnected);
        assert_eq!(err.code(), ErrorCode::TransportClose);
    }
}
