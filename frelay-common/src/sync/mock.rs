//! Scripted [`SyncApi`] for deterministic tests.

use super::{ApiError, SyncApi, SyncStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncApiCall {
    Trigger(String),
    Status(String),
}

#[derive(Debug, Default)]
struct Script {
    triggers: VecDeque<Result<(), ApiError>>,
    statuses: VecDeque<Result<SyncStatus, ApiError>>,
    default_status: Option<SyncStatus>,
    calls: Vec<SyncApiCall>,
}

/// In-memory sync API. Scripted results are consumed FIFO.
///
/// With no scripted trigger result the trigger succeeds. With no scripted
/// status the default status is returned, or an error if none is set.
#[derive(Debug, Clone, Default)]
pub struct MockSyncApi {
    script: Arc<Mutex<Script>>,
}

impl MockSyncApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose syncs always succeed on the first status check.
    pub fn always_succeeds() -> Self {
        let api = Self::new();
        api.set_default_status(SyncStatus::new(crate::types::SyncJobState::Succeeded));
        api
    }

    pub fn push_trigger(&self, result: Result<(), ApiError>) {
        self.script
            .lock()
            .expect("sync script mutex poisoned")
            .triggers
            .push_back(result);
    }

    pub fn push_status(&self, result: Result<SyncStatus, ApiError>) {
        self.script
            .lock()
            .expect("sync script mutex poisoned")
            .statuses
            .push_back(result);
    }

    pub fn set_default_status(&self, status: SyncStatus) {
        self.script
            .lock()
            .expect("sync script mutex poisoned")
            .default_status = Some(status);
    }

    /// Snapshot of all calls received by the mock.
    pub fn calls(&self) -> Vec<SyncApiCall> {
        self.script
            .lock()
            .expect("sync script mutex poisoned")
            .calls
            .clone()
    }

    pub fn trigger_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SyncApiCall::Trigger(_)))
            .count()
    }

    pub fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SyncApiCall::Status(_)))
            .count()
    }
}

#[async_trait]
impl SyncApi for MockSyncApi {
    async fn trigger(&self, sync_id: &str) -> Result<(), ApiError> {
        let mut script = self.script.lock().expect("sync script mutex poisoned");
        script.calls.push(SyncApiCall::Trigger(sync_id.to_string()));
        script.triggers.pop_front().unwrap_or(Ok(()))
    }

    async fn status(&self, sync_id: &str) -> Result<SyncStatus, ApiError> {
        let mut script = self.script.lock().expect("sync script mutex poisoned");
        script.calls.push(SyncApiCall::Status(sync_id.to_string()));
        match script.statuses.pop_front() {
            Some(result) => result,
            None => script
                .default_status
                .clone()
                .ok_or_else(|| ApiError::network("mock sync API has no scripted status")),
        }
    }
}
