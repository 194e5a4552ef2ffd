//! REST client for the sync service.
//!
//! - Trigger: `POST {base}/syncs/{id}/trigger` with `{"fullResync": false}`
//! - Status: `GET {base}/syncs/{id}`, reading the `status` field
//!
//! Requests carry a bearer token. Error bodies are masked and truncated
//! before they reach logs or notifications.

use super::{ApiError, SyncApi, SyncStatus};
use crate::config::SyncSettings;
use crate::types::SyncJobState;
use crate::util::{mask_sensitive_text, truncate_for_message};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct HttpSyncApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for HttpSyncApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSyncApi")
            .field("base_url", &self.base_url)
            .field("api_key", &crate::util::mask_secret(&self.api_key))
            .finish()
    }
}

impl HttpSyncApi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("frelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_settings(settings: &SyncSettings) -> Result<Self, ApiError> {
        Self::new(
            settings.api_url.clone(),
            settings.api_key.clone(),
            settings.request_timeout,
        )
    }

    fn sync_url(&self, sync_id: &str) -> String {
        format!("{}/syncs/{}", self.base_url, sync_id)
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::http(status, clean_body(&body))
    }
}

fn clean_body(body: &str) -> String {
    truncate_for_message(&mask_sensitive_text(body.trim()), MAX_ERROR_BODY_CHARS)
}

fn network_error(err: &reqwest::Error) -> ApiError {
    ApiError::network(mask_sensitive_text(&err.to_string()))
}

#[async_trait]
impl SyncApi for HttpSyncApi {
    async fn trigger(&self, sync_id: &str) -> Result<(), ApiError> {
        let url = format!("{}/trigger", self.sync_url(sync_id));
        debug!(url = %url, "Sending sync trigger");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "fullResync": false }))
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn status(&self, sync_id: &str) -> Result<SyncStatus, ApiError> {
        let response = self
            .client
            .get(self.sync_url(sync_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let code = response.status();
        if !code.is_success() {
            return Err(Self::error_from(response).await);
        }

        let body = response.text().await.map_err(|e| network_error(&e))?;
        let parsed: SyncResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::http(
                code.as_u16(),
                format!("undecodable status body ({}): {}", e, clean_body(&body)),
            )
        })?;

        let status = SyncStatus::new(SyncJobState::parse(&parsed.status));
        Ok(match parsed.error {
            Some(detail) if !detail.is_empty() => status.with_detail(detail),
            _ => status,
        })
    }
}
