//! Downstream sync job protocol.
//!
//! A sync is started with a single trigger request and then polled until it
//! reaches a terminal state or the attempt budget runs out. The remote API
//! is reached through [`SyncApi`]; [`SyncRunner`] owns the polling policy.

pub mod http;
pub mod mock;
pub mod runner;

pub use http::HttpSyncApi;
pub use mock::{MockSyncApi, SyncApiCall};
pub use runner::{PollPolicy, SyncRunner};

use crate::errors::describe_response;
use crate::types::SyncJobState;
use async_trait::async_trait;
use thiserror::Error;

/// A failed API exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_response(.status, .body))]
pub struct ApiError {
    /// HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Response body or transport error text, already masked.
    pub body: String,
}

impl ApiError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: message.into(),
        }
    }
}

/// Current status of a sync job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncJobState,
    /// Error or progress detail reported alongside the state.
    pub detail: Option<String>,
}

impl SyncStatus {
    pub fn new(state: SyncJobState) -> Self {
        Self {
            state,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Ask the service to start a run of `sync_id`.
    async fn trigger(&self, sync_id: &str) -> Result<(), ApiError>;

    /// Fetch the current state of `sync_id`.
    async fn status(&self, sync_id: &str) -> Result<SyncStatus, ApiError>;
}
