//! Remote file selection.
//!
//! Picks at most one file per configured pattern from a directory listing.
//! A file qualifies when it is a regular file, carries today's or
//! yesterday's date token, and contains the pattern. Among qualifying files
//! the most recently modified wins.

use crate::config::{ConfigError, EnvError};
use crate::errors::RelayError;
use crate::types::RemoteEntry;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::fmt::Write;
use tracing::{debug, warn};

/// Date tokens accepted for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTokens {
    pub today: String,
    pub yesterday: String,
}

impl DateTokens {
    pub fn matches(&self, name: &str) -> bool {
        name.contains(&self.today) || name.contains(&self.yesterday)
    }
}

/// Outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Chosen file names, in pattern order.
    pub files: Vec<String>,
    /// Patterns without a qualifying file.
    pub missing_patterns: Vec<String>,
    /// Every regular file carrying an accepted date token.
    pub candidates: Vec<String>,
}

fn render(date: NaiveDate, format: &str) -> Result<String, RelayError> {
    let mut token = String::new();
    write!(token, "{}", date.format(format)).map_err(|_| {
        RelayError::Config(ConfigError::from_env_errors(vec![EnvError::InvalidValue {
            var: "FILE_DATE_FORMAT".to_string(),
            expected: "strftime date format".to_string(),
            value: format.to_string(),
        }]))
    })?;
    Ok(token)
}

/// Compute today's and yesterday's tokens for `reference`.
///
/// The calendar day is taken in the reference's own offset; both tokens are
/// accepted at any hour.
pub fn date_tokens(
    reference: DateTime<FixedOffset>,
    format: &str,
) -> Result<DateTokens, RelayError> {
    let today = reference.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    Ok(DateTokens {
        today: render(today, format)?,
        yesterday: render(yesterday, format)?,
    })
}

/// Select the files to relay for `reference`'s day.
pub fn select(
    entries: &[RemoteEntry],
    reference: DateTime<FixedOffset>,
    patterns: &[String],
    date_format: &str,
) -> Result<Selection, RelayError> {
    let tokens = date_tokens(reference, date_format)?;
    debug!(today = %tokens.today, yesterday = %tokens.yesterday, "Selecting files");

    let dated: Vec<&RemoteEntry> = entries
        .iter()
        .filter(|e| e.is_file() && tokens.matches(&e.name))
        .collect();
    let candidates: Vec<String> = dated.iter().map(|e| e.name.clone()).collect();

    let mut matching: Vec<&RemoteEntry> = dated
        .into_iter()
        .filter(|e| patterns.iter().any(|p| e.name.contains(p.as_str())))
        .collect();
    // sort_by is stable: ties keep listing order
    matching.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    let mut files: Vec<String> = Vec::new();
    let mut missing_patterns = Vec::new();
    for pattern in patterns {
        let pick = matching
            .iter()
            .find(|e| e.name.contains(pattern.as_str()) && !files.contains(&e.name));
        match pick {
            Some(entry) => {
                debug!(pattern = %pattern, file = %entry.name, "Pattern matched");
                files.push(entry.name.clone());
            }
            None => {
                warn!(
                    pattern = %pattern,
                    today = %tokens.today,
                    yesterday = %tokens.yesterday,
                    "No file found for pattern"
                );
                missing_patterns.push(pattern.clone());
            }
        }
    }

    if files.is_empty() {
        return Err(RelayError::NoMatchingFiles {
            candidates,
            patterns: patterns.to_vec(),
        });
    }

    Ok(Selection {
        files,
        missing_patterns,
        candidates,
    })
}
