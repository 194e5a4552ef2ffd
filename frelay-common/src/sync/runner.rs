//! Trigger-then-poll driver for a downstream sync.

use super::SyncApi;
use crate::config::SyncSettings;
use crate::errors::RelayError;
use crate::types::SyncJobState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often and how long to poll a triggered sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status check.
    pub interval: Duration,
    /// Number of status checks before giving up (minimum 1).
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            interval: settings.poll_interval,
            max_attempts: settings.max_poll_attempts,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Drives one sync from trigger to a terminal state.
#[derive(Clone)]
pub struct SyncRunner {
    api: Arc<dyn SyncApi>,
    policy: PollPolicy,
}

impl SyncRunner {
    pub fn new(api: Arc<dyn SyncApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Trigger `sync_id` and wait for it to finish.
    ///
    /// The trigger is sent once. Each status check is preceded by one
    /// `interval` sleep. A failed status request ends the wait at once;
    /// non-terminal states keep polling until the budget is spent.
    pub async fn trigger_and_wait(&self, sync_id: &str) -> Result<(), RelayError> {
        self.api
            .trigger(sync_id)
            .await
            .map_err(|e| RelayError::TriggerFailed {
                sync_id: sync_id.to_string(),
                status: e.status,
                body: e.body,
            })?;
        info!(sync_id, "Sync triggered");

        let max_attempts = self.policy.attempts();
        let mut last_state = SyncJobState::Pending;

        for attempt in 1..=max_attempts {
            sleep(self.policy.interval).await;

            let status = self
                .api
                .status(sync_id)
                .await
                .map_err(|e| RelayError::StatusCheckFailed {
                    sync_id: sync_id.to_string(),
                    status: e.status,
                    body: e.body,
                })?;
            debug!(sync_id, attempt, max_attempts, state = %status.state, "Polled sync status");

            if status.state.is_success() {
                info!(sync_id, attempt, "Sync completed successfully");
                return Ok(());
            }
            if status.state.is_terminal() {
                warn!(sync_id, attempt, state = %status.state, "Sync ended unsuccessfully");
                return Err(RelayError::SyncJobFailed {
                    sync_id: sync_id.to_string(),
                    detail: status
                        .detail
                        .unwrap_or_else(|| format!("sync reported {}", status.state)),
                    state: status.state,
                });
            }
            last_state = status.state;
        }

        warn!(sync_id, max_attempts, last_state = %last_state, "Sync did not finish in time");
        Err(RelayError::SyncTimeout {
            sync_id: sync_id.to_string(),
            attempts: max_attempts,
            last_state,
        })
    }
}
