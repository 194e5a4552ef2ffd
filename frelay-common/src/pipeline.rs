//! Per-file transfer pipeline: validate, copy, archive.

use crate::config::SftpSettings;
use crate::errors::RelayError;
use crate::transport::RemoteTransport;
use crate::util::remote_join;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Copies one source file to the fixed destination and archives it.
#[derive(Debug, Clone)]
pub struct FileTransferPipeline {
    pub source_dir: String,
    pub dest_dir: String,
    pub archive_dir: String,
    pub dest_filename: String,
    pub max_age_hours: u32,
}

impl FileTransferPipeline {
    pub fn from_settings(sftp: &SftpSettings, max_age_hours: u32) -> Self {
        Self {
            source_dir: sftp.source_dir.clone(),
            dest_dir: sftp.dest_dir.clone(),
            archive_dir: sftp.archive_dir.clone(),
            dest_filename: sftp.dest_filename.clone(),
            max_age_hours,
        }
    }

    pub fn source_path(&self, name: &str) -> String {
        remote_join(&self.source_dir, name)
    }

    pub fn dest_path(&self) -> String {
        remote_join(&self.dest_dir, &self.dest_filename)
    }

    pub fn archive_path(&self, name: &str) -> String {
        remote_join(&self.archive_dir, name)
    }

    /// Run the pipeline for `source_name`.
    ///
    /// Nothing on the remote side changes until the file exists, is
    /// non-empty and is no older than `max_age_hours`. The source is
    /// archived only after the destination write completed. The first
    /// failing step aborts the rest.
    pub async fn process_file(
        &self,
        transport: &mut dyn RemoteTransport,
        source_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RelayError> {
        let source = self.source_path(source_name);
        let dest = self.dest_path();
        let archive = self.archive_path(source_name);

        if !transport.exists(&source).await? {
            return Err(RelayError::SourceNotFound { path: source });
        }

        let stat = transport.stat(&source).await?;
        if stat.size == 0 {
            return Err(RelayError::EmptyFile { path: source });
        }

        let age = now.signed_duration_since(stat.modified_at);
        let age_hours = age.num_milliseconds() as f64 / 3_600_000.0;
        if age_hours > f64::from(self.max_age_hours) {
            return Err(RelayError::StaleFile {
                path: source,
                modified_at: stat.modified_at,
                age_hours,
                max_age_hours: self.max_age_hours,
            });
        }
        debug!(source = %source, size = stat.size, age_hours, "Source file validated");

        let data = transport.read(&source).await?;
        transport.write(&dest, &data).await?;
        debug!(source = %source, dest = %dest, bytes = data.len(), "Copied file");

        transport.rename(&source, &archive).await?;
        info!(source = %source, dest = %dest, archive = %archive, "File relayed and archived");
        Ok(())
    }
}
