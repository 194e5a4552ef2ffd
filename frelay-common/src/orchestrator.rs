//! One relay run from connect to result.
//!
//! The orchestrator owns the transport session for the whole run. Setup
//! failures (connect, listing, selection) abort the run with a single
//! notification; failures while processing a file are recorded for that
//! file and the run moves on to the next one.

use crate::clock::Clock;
use crate::config::{RelayConfig, SelectionSettings};
use crate::errors::RelayError;
use crate::notify::{NotificationPublisher, Notifier};
use crate::pipeline::FileTransferPipeline;
use crate::selector::{self, Selection};
use crate::sync::{PollPolicy, SyncApi, SyncRunner};
use crate::transport::RemoteTransport;
use crate::types::{Credentials, FileOutcome, RunResult};
use serde_json::json;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

pub struct SyncOrchestrator<T: RemoteTransport> {
    transport: T,
    credentials: Credentials,
    source_dir: String,
    selection: SelectionSettings,
    pipeline: FileTransferPipeline,
    runner: SyncRunner,
    sync_id: String,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl<T: RemoteTransport> SyncOrchestrator<T> {
    pub fn new(
        config: &RelayConfig,
        transport: T,
        api: Arc<dyn SyncApi>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            credentials: config.sftp.credentials(),
            source_dir: config.sftp.source_dir.clone(),
            selection: config.selection.clone(),
            pipeline: FileTransferPipeline::from_settings(
                &config.sftp,
                config.selection.max_age_hours,
            ),
            runner: SyncRunner::new(api, PollPolicy::from_settings(&config.sync)),
            sync_id: config.sync.sync_id.clone(),
            notifier: Notifier::new(
                publisher,
                config.notify.topic_arn.clone(),
                config.notify.subject.clone(),
                clock.clone(),
            ),
            clock,
        }
    }

    /// Run one relay and report what happened. Never fails; every error
    /// ends up in the returned result and in a notification.
    pub async fn execute(&mut self) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("relay_run", run_id = %run_id);
        self.execute_run(run_id).instrument(span).await
    }

    async fn execute_run(&mut self, run_id: String) -> RunResult {
        info!(
            host = %self.credentials.host,
            source_dir = %self.source_dir,
            patterns = ?self.selection.patterns,
            "Starting relay run"
        );

        let selection = match self.prepare().await {
            Ok(selection) => selection,
            Err((context, error)) => {
                error!(code = %error.code(), error = %error, context = %context, "Relay run aborted");
                self.close().await;
                let extra = match &error {
                    RelayError::NoMatchingFiles {
                        candidates,
                        patterns,
                    } => Some(json!({ "candidates": candidates, "patterns": patterns })),
                    _ => None,
                };
                self.notifier.notify(&error, &context, extra.as_ref()).await;
                return RunResult::aborted(run_id, &error);
            }
        };

        let mut outcomes = Vec::with_capacity(selection.files.len());
        for name in &selection.files {
            match self.process(name).await {
                Ok(()) => outcomes.push(FileOutcome::success(name.as_str())),
                Err(error) => {
                    warn!(file = %name, code = %error.code(), error = %error, "File failed");
                    self.notifier
                        .notify(&error, &format!("Processing file {}", name), None)
                        .await;
                    outcomes.push(FileOutcome::failure(name.as_str(), &error));
                }
            }
        }

        self.close().await;

        let result = RunResult::from_outcomes(run_id, outcomes);
        if result.partial_failure {
            warn!(failed = ?result.failed_filenames, "{}", result.message);
        } else if result.success {
            info!("{}", result.message);
        } else {
            error!(failed = ?result.failed_filenames, "{}", result.message);
        }
        result
    }

    /// Connect, list and select. Errors carry the phase they occurred in.
    async fn prepare(&mut self) -> Result<Selection, (String, RelayError)> {
        self.transport
            .connect(&self.credentials)
            .await
            .map_err(|e| {
                (
                    format!(
                        "Connecting to {}:{}",
                        self.credentials.host, self.credentials.port
                    ),
                    RelayError::from(e),
                )
            })?;

        let entries = self
            .transport
            .list(&self.source_dir)
            .await
            .map_err(|e| (format!("Listing {}", self.source_dir), RelayError::from(e)))?;

        let reference = self
            .clock
            .now()
            .with_timezone(&self.selection.utc_offset);
        let selection = selector::select(
            &entries,
            reference,
            &self.selection.patterns,
            &self.selection.date_format,
        )
        .map_err(|e| (format!("Selecting files in {}", self.source_dir), e))?;

        info!(
            files = ?selection.files,
            missing_patterns = ?selection.missing_patterns,
            "Selected {} file(s)",
            selection.files.len()
        );
        Ok(selection)
    }

    async fn process(&mut self, name: &str) -> Result<(), RelayError> {
        let now = self.clock.now();
        self.pipeline
            .process_file(&mut self.transport, name, now)
            .await?;
        self.runner.trigger_and_wait(&self.sync_id).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.transport.close().await {
            let error = RelayError::TransportClose(e);
            error!(code = %error.code(), error = %error, "Failed to close transport session");
        }
    }

    /// Consume the orchestrator and hand back its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
