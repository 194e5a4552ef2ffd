//! Error catalog for frelay.
//!
//! Every error the relay can report maps to a stable code with a short
//! message and remediation steps. Notifications include the code and the
//! remediation so an operator can act without reading logs.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                              |
//! |------------|-------------|------------------------------------------|
//! | E001-E099  | Config      | Configuration and setup errors           |
//! | E100-E199  | Selection   | Remote file selection errors             |
//! | E200-E299  | Transfer    | File validation and SFTP transfer errors |
//! | E300-E399  | Sync        | Downstream sync trigger/poll errors      |
//! | E400-E499  | Notify      | Operator notification errors             |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all relay error scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// Required environment variables are missing
    ConfigMissing,
    /// Environment variables have invalid values
    ConfigInvalid,
    /// Local override file could not be read or parsed
    ConfigFileError,

    // =========================================================================
    // Selection Errors (E100-E199)
    // =========================================================================
    /// No remote file matched any pattern for today or yesterday
    NoMatchingFiles,

    // =========================================================================
    // Transfer Errors (E200-E299)
    // =========================================================================
    /// Selected source file disappeared before processing
    SourceNotFound,
    /// Source file has zero bytes
    EmptyFile,
    /// Source file is older than the freshness limit
    StaleFile,
    /// Could not open the SFTP session
    TransportConnect,
    /// SFTP authentication was rejected
    TransportAuth,
    /// An SFTP operation failed mid-session
    TransportOperation,
    /// Closing the SFTP session failed
    TransportClose,

    // =========================================================================
    // Sync Errors (E300-E399)
    // =========================================================================
    /// Downstream sync trigger was rejected
    SyncTriggerFailed,
    /// Downstream status check was rejected
    SyncStatusCheckFailed,
    /// Downstream sync finished in a failed or cancelled state
    SyncJobFailed,
    /// Downstream sync did not finish within the poll budget
    SyncTimeout,

    // =========================================================================
    // Notify Errors (E400-E499)
    // =========================================================================
    /// Publishing an operator notification failed
    NotificationFailed,
}

impl ErrorCode {
    /// Returns the numeric part of the code.
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigMissing => 1,
            Self::ConfigInvalid => 2,
            Self::ConfigFileError => 3,

            Self::NoMatchingFiles => 100,

            Self::SourceNotFound => 200,
            Self::EmptyFile => 201,
            Self::StaleFile => 202,
            Self::TransportConnect => 210,
            Self::TransportAuth => 211,
            Self::TransportOperation => 212,
            Self::TransportClose => 213,

            Self::SyncTriggerFailed => 300,
            Self::SyncStatusCheckFailed => 301,
            Self::SyncJobFailed => 302,
            Self::SyncTimeout => 303,

            Self::NotificationFailed => 400,
        }
    }

    /// Returns the formatted error code string (e.g., "FRELAY-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("FRELAY-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Selection,
            200..=299 => ErrorCategory::Transfer,
            300..=399 => ErrorCategory::Sync,
            _ => ErrorCategory::Notify,
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Returns the error message template.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration contains invalid values",
            Self::ConfigFileError => "Local configuration file could not be loaded",
            Self::NoMatchingFiles => "No export files matched the configured patterns",
            Self::SourceNotFound => "Source file not found on the SFTP server",
            Self::EmptyFile => "Source file is empty",
            Self::StaleFile => "Source file is older than the freshness limit",
            Self::TransportConnect => "Could not connect to the SFTP server",
            Self::TransportAuth => "SFTP authentication failed",
            Self::TransportOperation => "SFTP operation failed",
            Self::TransportClose => "Failed to close the SFTP session",
            Self::SyncTriggerFailed => "Downstream sync could not be triggered",
            Self::SyncStatusCheckFailed => "Downstream sync status could not be read",
            Self::SyncJobFailed => "Downstream sync failed",
            Self::SyncTimeout => "Downstream sync did not finish in time",
            Self::NotificationFailed => "Operator notification could not be sent",
        }
    }

    /// Returns remediation steps for this error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigMissing => &[
                "Set every variable listed in the error",
                "For local runs pass --tfvars or --env-file",
            ],
            Self::ConfigInvalid => &[
                "Check the value format reported for each variable",
                "Run `frelay check-config` to see resolved values",
            ],
            Self::ConfigFileError => &[
                "Check that the override file exists and is readable",
            ],
            Self::NoMatchingFiles => &[
                "Confirm the upstream export ran and uploaded today's files",
                "Check FILE_PATTERNS and FILE_DATE_FORMAT against the file names",
                "Files already moved to the archive directory are not picked up again",
            ],
            Self::SourceNotFound => &[
                "Check whether another process moved or deleted the file",
                "Re-run once the file is back in the source directory",
            ],
            Self::EmptyFile => &[
                "Ask the upstream producer to re-export the file",
                "The file was left in place; re-run after it is replaced",
            ],
            Self::StaleFile => &[
                "A leftover file from an earlier export was found; move it to the archive manually if it was already loaded",
                "Adjust FILE_MAX_AGE_HOURS if the producer publishes earlier than expected",
            ],
            Self::TransportConnect => &[
                "Verify SFTP_HOST and SFTP_PORT",
                "Check network access from the job to the SFTP server",
            ],
            Self::TransportAuth => &[
                "Verify SFTP_USERNAME and SFTP_PASSWORD",
                "Check whether the account is locked or the password rotated",
            ],
            Self::TransportOperation => &[
                "Check directory permissions for the SFTP user",
                "Verify SFTP_SOURCE_DIR, SFTP_DEST_DIR and SFTP_ARCHIVE_DIR exist",
            ],
            Self::TransportClose => &["No action needed unless this repeats"],
            Self::SyncTriggerFailed => &[
                "Verify HIGHTOUCH_API_KEY and HIGHTOUCH_SYNC_ID",
                "Check whether the sync is disabled or already running",
            ],
            Self::SyncStatusCheckFailed => &[
                "Check the sync API availability",
                "The copied file is in place; trigger the sync manually if needed",
            ],
            Self::SyncJobFailed => &[
                "Open the sync run in the downstream tool for row-level errors",
                "The destination file still holds the copied data; re-trigger after fixing",
            ],
            Self::SyncTimeout => &[
                "The sync may still be running; check it in the downstream tool",
                "Raise SYNC_MAX_POLL_ATTEMPTS or SYNC_POLL_INTERVAL_SECS for large loads",
            ],
            Self::NotificationFailed => &[
                "Verify SNS_TOPIC_ARN and publish permissions",
            ],
        }
    }

    /// Returns all error codes.
    #[must_use]
    pub fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigMissing,
            Self::ConfigInvalid,
            Self::ConfigFileError,
            Self::NoMatchingFiles,
            Self::SourceNotFound,
            Self::EmptyFile,
            Self::StaleFile,
            Self::TransportConnect,
            Self::TransportAuth,
            Self::TransportOperation,
            Self::TransportClose,
            Self::SyncTriggerFailed,
            Self::SyncStatusCheckFailed,
            Self::SyncJobFailed,
            Self::SyncTimeout,
            Self::NotificationFailed,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration and setup errors (E001-E099)
    Config,
    /// Remote file selection errors (E100-E199)
    Selection,
    /// File validation and transfer errors (E200-E299)
    Transfer,
    /// Downstream sync errors (E300-E399)
    Sync,
    /// Notification errors (E400-E499)
    Notify,
}

impl ErrorCategory {
    /// Returns a human-readable name for the category.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Selection => "Selection",
            Self::Transfer => "Transfer",
            Self::Sync => "Sync",
            Self::Notify => "Notification",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete error entry with all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "FRELAY-E001")
    pub code: String,
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
}

impl ErrorEntry {
    /// Formats the entry with numbered remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("Remediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }

    /// Formats the error as a single line.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brief())
    }
}
