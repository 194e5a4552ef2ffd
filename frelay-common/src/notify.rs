//! Operator notifications.
//!
//! Notifications are best effort: a failed publish is logged and dropped,
//! it never changes the outcome of a run.

use crate::clock::Clock;
use crate::errors::{ErrorCode, RelayError};
use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{error, info};

/// SNS rejects subjects longer than this.
const MAX_SUBJECT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Failed to publish notification to {topic}: {message}")]
    Publish { topic: String, message: String },
}

impl NotifyError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::NotificationFailed
    }
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), NotifyError>;
}

/// Publishes to an AWS SNS topic.
pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsPublisher {
    /// Build a client from the default AWS credential and region chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_sns::Client::new(&config),
        }
    }

    pub fn with_client(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationPublisher for SnsPublisher {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), NotifyError> {
        let subject: String = subject.chars().take(MAX_SUBJECT_CHARS).collect();
        self.client
            .publish()
            .topic_arn(topic)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| NotifyError::Publish {
                topic: topic.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

/// Writes notifications to the log instead of publishing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl NotificationPublisher for LogPublisher {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), NotifyError> {
        info!(topic, subject, "Notification (not published)\n{}", message);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub topic: String,
    pub subject: String,
    pub message: String,
}

/// Keeps every notification in memory, optionally failing each publish.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<PublishedNotification>>>,
    fail_with: Option<String>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails after being recorded.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PublishedNotification> {
        self.published
            .lock()
            .expect("published mutex poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().expect("published mutex poisoned").len()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.published
            .lock()
            .expect("published mutex poisoned")
            .push(PublishedNotification {
                topic: topic.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            });
        match &self.fail_with {
            Some(message) => Err(NotifyError::Publish {
                topic: topic.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Render the notification body for `error`.
pub fn format_message(
    error: &RelayError,
    context: &str,
    extra: Option<&Value>,
    at: DateTime<Utc>,
) -> String {
    let entry = error.code().entry();
    let mut body = String::new();
    let _ = writeln!(body, "Error during SFTP sync:");
    let _ = writeln!(body, "Time: {}", at.to_rfc3339_opts(SecondsFormat::Millis, true));
    let _ = writeln!(body, "Context: {}", context);
    let _ = writeln!(body, "Code: {} ({})", entry.code, entry.category);
    let _ = writeln!(body, "Error: {}", error);

    if !entry.remediation.is_empty() {
        let _ = writeln!(body, "\nRemediation steps:");
        for (i, step) in entry.remediation.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", i + 1, step);
        }
    }

    if let Some(extra) = extra {
        let pretty = serde_json::to_string_pretty(extra).unwrap_or_else(|_| extra.to_string());
        let _ = writeln!(body, "\nDetails:\n{}", pretty);
    }
    body
}

/// Sends failure notifications to the operator topic.
#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn NotificationPublisher>,
    topic: String,
    subject: String,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(
        publisher: Arc<dyn NotificationPublisher>,
        topic: impl Into<String>,
        subject: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            subject: subject.into(),
            clock,
        }
    }

    /// Publish a notification for `error`. Never fails.
    pub async fn notify(&self, error: &RelayError, context: &str, extra: Option<&Value>) {
        let message = format_message(error, context, extra, self.clock.now());
        match self
            .publisher
            .publish(&self.topic, &self.subject, &message)
            .await
        {
            Ok(()) => info!(
                topic = %self.topic,
                code = %error.code(),
                context,
                "Error notification sent"
            ),
            Err(e) => error!(
                code = %e.code(),
                error = %e,
                original_error = %error,
                "Failed to send error notification"
            ),
        }
    }
}
