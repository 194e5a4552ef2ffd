//! Configuration system for frelay.
//!
//! This module provides configuration management including:
//! - Environment variable parsing with type safety
//! - `.tfvars` and `.env` override files for local runs
//! - Source tracking for `frelay check-config`
//! - Validation before the relay starts

pub mod dotenv;
pub mod env;
pub mod source;
pub mod tfvars;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use crate::errors::ErrorCode;
use crate::types::Credentials;
use crate::util::mask_secret;
use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.hightouch.io/api/v1";
pub const DEFAULT_DATE_FORMAT: &str = "%m%d%Y";
pub const DEFAULT_SUBJECT: &str = "SFTP Sync Error";

/// Errors raised while assembling the relay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", describe_env_errors(.missing, .invalid))]
    Env {
        missing: Vec<String>,
        invalid: Vec<EnvError>,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {what} pattern: {source}")]
    Pattern {
        what: &'static str,
        #[source]
        source: regex::Error,
    },
}

fn describe_env_errors(missing: &[String], invalid: &[EnvError]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        ));
    }
    if !invalid.is_empty() {
        let details: Vec<String> = invalid.iter().map(ToString::to_string).collect();
        parts.push(format!("Invalid configuration: {}", details.join("; ")));
    }
    parts.join(". ")
}

impl ConfigError {
    /// Split collected parser errors into missing and invalid variables.
    pub fn from_env_errors(errors: Vec<EnvError>) -> Self {
        let (missing, invalid): (Vec<_>, Vec<_>) = errors
            .into_iter()
            .partition(|e| matches!(e, EnvError::Missing { .. }));
        Self::Env {
            missing: missing.into_iter().map(|e| e.var().to_string()).collect(),
            invalid,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Env { missing, .. } if !missing.is_empty() => ErrorCode::ConfigMissing,
            Self::Env { .. } | Self::Pattern { .. } => ErrorCode::ConfigInvalid,
            Self::Read { .. } => ErrorCode::ConfigFileError,
        }
    }
}

/// Remote file store settings.
#[derive(Clone)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub source_dir: String,
    pub dest_dir: String,
    pub archive_dir: String,
    /// Fixed name every relayed file is written to in `dest_dir`.
    pub dest_filename: String,
    pub connect_timeout: Duration,
}

impl SftpSettings {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for SftpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("source_dir", &self.source_dir)
            .field("dest_dir", &self.dest_dir)
            .field("archive_dir", &self.archive_dir)
            .field("dest_filename", &self.dest_filename)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Downstream sync API settings.
#[derive(Clone)]
pub struct SyncSettings {
    pub api_url: String,
    pub api_key: String,
    pub sync_id: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub request_timeout: Duration,
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("sync_id", &self.sync_id)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionSettings {
    /// Substrings identifying each expected file, in priority order.
    pub patterns: Vec<String>,
    /// strftime format of the date token embedded in file names.
    pub date_format: String,
    /// Offset used to decide which calendar day "today" is.
    pub utc_offset: FixedOffset,
    pub max_age_hours: u32,
}

#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub topic_arn: String,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

/// Fully validated relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub sftp: SftpSettings,
    pub sync: SyncSettings,
    pub selection: SelectionSettings,
    pub notify: NotifySettings,
    pub log: LogSettings,
}

/// One resolved setting, as shown by `frelay check-config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub name: String,
    /// Display value; secrets are masked.
    pub value: String,
    pub source: ConfigSource,
}

/// A validated configuration plus the provenance of each setting.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RelayConfig,
    pub entries: Vec<ConfigEntry>,
}

#[derive(Default)]
struct Report {
    entries: Vec<ConfigEntry>,
}

impl Report {
    fn record<T: fmt::Display>(&mut self, name: &str, value: &Sourced<T>) -> &mut Self {
        self.entries.push(ConfigEntry {
            name: name.to_string(),
            value: value.value.to_string(),
            source: value.source,
        });
        self
    }

    fn record_secret(&mut self, name: &str, value: &Sourced<String>) -> &mut Self {
        self.entries.push(ConfigEntry {
            name: name.to_string(),
            value: mask_secret(&value.value),
            source: value.source,
        });
        self
    }

    fn record_list(&mut self, name: &str, value: &Sourced<Vec<String>>) -> &mut Self {
        self.entries.push(ConfigEntry {
            name: name.to_string(),
            value: value.value.join(","),
            source: value.source,
        });
        self
    }
}

/// Whether `format` renders a bare calendar date.
///
/// Time and offset specifiers (`%H`, `%z`, ...) parse but cannot be
/// rendered from a date alone.
pub fn is_valid_date_format(format: &str) -> bool {
    use std::fmt::Write;

    let mut rendered = String::new();
    !format.is_empty() && write!(rendered, "{}", NaiveDate::MIN.format(format)).is_ok()
}

impl RelayConfig {
    /// Load from the process environment, overlaid by `overrides`.
    pub fn load(overrides: HashMap<String, String>) -> Result<LoadedConfig, ConfigError> {
        let mut parser = EnvParser::new().with_overrides(overrides);
        Self::from_parser(&mut parser)
    }

    /// Read every setting through `parser`, reporting all problems at once.
    pub fn from_parser(parser: &mut EnvParser) -> Result<LoadedConfig, ConfigError> {
        let host = parser.require_string("SFTP_HOST");
        let port = parser.require_u16("SFTP_PORT");
        let username = parser.require_string("SFTP_USERNAME");
        let password = parser.require_string("SFTP_PASSWORD");
        let source_dir = parser.require_string("SFTP_SOURCE_DIR");
        let dest_dir = parser.require_string("SFTP_DEST_DIR");
        let archive_dir = parser.require_string("SFTP_ARCHIVE_DIR");
        let dest_filename = parser.require_string("SFTP_DEST_FILENAME");
        let connect_timeout = parser.get_u64_range("SFTP_CONNECT_TIMEOUT_SECS", 20, 1, 300);

        let api_key = parser.require_string("HIGHTOUCH_API_KEY");
        let sync_id = parser.require_string("HIGHTOUCH_SYNC_ID");
        let api_url = parser.get_string("HIGHTOUCH_API_URL", DEFAULT_API_URL);
        let poll_interval = parser.get_u64_range("SYNC_POLL_INTERVAL_SECS", 10, 1, 600);
        let max_poll_attempts = parser.get_u32_range("SYNC_MAX_POLL_ATTEMPTS", 30, 1, 1000);
        let request_timeout = parser.get_u64_range("SYNC_REQUEST_TIMEOUT_SECS", 30, 1, 300);

        let patterns = parser.require_string_list("FILE_PATTERNS");
        let max_age_hours = parser.get_u32_range("FILE_MAX_AGE_HOURS", 24, 1, 720);
        let date_format = parser.get_string("FILE_DATE_FORMAT", DEFAULT_DATE_FORMAT);
        let offset_minutes = parser.get_i32_range("FILE_DATE_UTC_OFFSET_MINUTES", 0, -840, 840);

        let topic_arn = parser.require_string("SNS_TOPIC_ARN");
        let subject = parser.get_string("SNS_SUBJECT", DEFAULT_SUBJECT);

        let log_level = parser.get_log_level("FRELAY_LOG_LEVEL", "info");
        let log_json = parser.get_bool("FRELAY_LOG_JSON", false);

        let mut errors = parser.take_errors();

        if !is_valid_date_format(&date_format.value) {
            errors.push(EnvError::InvalidValue {
                var: "FILE_DATE_FORMAT".to_string(),
                expected: "strftime date format (e.g. %m%d%Y)".to_string(),
                value: date_format.value.clone(),
            });
        }

        let utc_offset = FixedOffset::east_opt(offset_minutes.value * 60);
        if utc_offset.is_none() {
            errors.push(EnvError::InvalidValue {
                var: "FILE_DATE_UTC_OFFSET_MINUTES".to_string(),
                expected: "UTC offset in minutes".to_string(),
                value: offset_minutes.value.to_string(),
            });
        }

        let Some(utc_offset) = utc_offset.filter(|_| errors.is_empty()) else {
            return Err(ConfigError::from_env_errors(errors));
        };

        let mut report = Report::default();
        report
            .record("SFTP_HOST", &host)
            .record("SFTP_PORT", &port)
            .record("SFTP_USERNAME", &username)
            .record_secret("SFTP_PASSWORD", &password)
            .record("SFTP_SOURCE_DIR", &source_dir)
            .record("SFTP_DEST_DIR", &dest_dir)
            .record("SFTP_ARCHIVE_DIR", &archive_dir)
            .record("SFTP_DEST_FILENAME", &dest_filename)
            .record("SFTP_CONNECT_TIMEOUT_SECS", &connect_timeout)
            .record("HIGHTOUCH_API_URL", &api_url)
            .record_secret("HIGHTOUCH_API_KEY", &api_key)
            .record("HIGHTOUCH_SYNC_ID", &sync_id)
            .record("SYNC_POLL_INTERVAL_SECS", &poll_interval)
            .record("SYNC_MAX_POLL_ATTEMPTS", &max_poll_attempts)
            .record("SYNC_REQUEST_TIMEOUT_SECS", &request_timeout)
            .record_list("FILE_PATTERNS", &patterns)
            .record("FILE_MAX_AGE_HOURS", &max_age_hours)
            .record("FILE_DATE_FORMAT", &date_format)
            .record("FILE_DATE_UTC_OFFSET_MINUTES", &offset_minutes)
            .record("SNS_TOPIC_ARN", &topic_arn)
            .record("SNS_SUBJECT", &subject)
            .record("FRELAY_LOG_LEVEL", &log_level)
            .record("FRELAY_LOG_JSON", &log_json);

        let config = RelayConfig {
            sftp: SftpSettings {
                host: host.value,
                port: port.value,
                username: username.value,
                password: password.value,
                source_dir: source_dir.value,
                dest_dir: dest_dir.value,
                archive_dir: archive_dir.value,
                dest_filename: dest_filename.value,
                connect_timeout: Duration::from_secs(connect_timeout.value),
            },
            sync: SyncSettings {
                api_url: api_url.value.trim_end_matches('/').to_string(),
                api_key: api_key.value,
                sync_id: sync_id.value,
                poll_interval: Duration::from_secs(poll_interval.value),
                max_poll_attempts: max_poll_attempts.value,
                request_timeout: Duration::from_secs(request_timeout.value),
            },
            selection: SelectionSettings {
                patterns: patterns.value,
                date_format: date_format.value,
                utc_offset,
                max_age_hours: max_age_hours.value,
            },
            notify: NotifySettings {
                topic_arn: topic_arn.value,
                subject: subject.value,
            },
            log: LogSettings {
                level: log_level.value,
                json: log_json.value,
            },
        };

        Ok(LoadedConfig {
            config,
            entries: report.entries,
        })
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Build the overrides map from optional `.tfvars` and `.env` files.
///
/// `.env` entries are applied last and win over `.tfvars` entries.
pub fn load_overrides(
    tfvars_path: Option<&Path>,
    env_path: Option<&Path>,
) -> Result<HashMap<String, String>, ConfigError> {
    let mut overrides = HashMap::new();
    if let Some(path) = tfvars_path {
        let path = expand_home(path);
        let vars = tfvars::load_tfvars(&path)?;
        tracing::debug!(path = %path.display(), count = vars.len(), "Loaded tfvars overrides");
        overrides.extend(vars);
    }
    if let Some(path) = env_path {
        let path = expand_home(path);
        let vars = dotenv::load_dotenv(&path)?;
        tracing::debug!(path = %path.display(), count = vars.len(), "Loaded .env overrides");
        overrides.extend(vars);
    }
    Ok(overrides)
}
