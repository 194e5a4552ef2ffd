//! Transport over a local directory tree.
//!
//! Remote paths are resolved below `root`, so `/exports/a.csv` maps to
//! `<root>/exports/a.csv`. Used to rehearse a run without an SFTP server.

use super::{RemoteTransport, TransportError, TransportOp};
use crate::types::{Credentials, EntryKind, FileStat, RemoteEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub struct LocalTransport {
    root: PathBuf,
    connected: bool,
}

impl LocalTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a remote path under the root, refusing `..` components.
    fn resolve(&self, op: TransportOp, remote: &str) -> Result<PathBuf, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let relative = Path::new(remote.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(TransportError::operation(
                op,
                remote,
                "path escapes the local root",
            ));
        }
        Ok(self.root.join(relative))
    }
}

fn modified_at(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn entry_kind(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

#[async_trait]
impl RemoteTransport for LocalTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| TransportError::Connect {
                host: credentials.host.clone(),
                port: credentials.port,
                message: format!("local root {}: {}", self.root.display(), e),
            })?;
        if !meta.is_dir() {
            return Err(TransportError::Connect {
                host: credentials.host.clone(),
                port: credentials.port,
                message: format!("local root {} is not a directory", self.root.display()),
            });
        }
        debug!(root = %self.root.display(), "Opened local transport");
        self.connected = true;
        Ok(())
    }

    async fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let path = self.resolve(TransportOp::List, dir)?;
        let op_err = |e: std::io::Error| TransportError::operation(TransportOp::List, dir, e);

        let mut reader = tokio::fs::read_dir(&path).await.map_err(op_err)?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(op_err)? {
            // symlink_metadata so links are reported as Other
            let meta = tokio::fs::symlink_metadata(entry.path())
                .await
                .map_err(op_err)?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: entry_kind(meta.file_type()),
                size: meta.len(),
                modified_at: modified_at(&meta),
            });
        }
        Ok(entries)
    }

    async fn exists(&mut self, path: &str) -> Result<bool, TransportError> {
        let local = self.resolve(TransportOp::Exists, path)?;
        tokio::fs::try_exists(&local)
            .await
            .map_err(|e| TransportError::operation(TransportOp::Exists, path, e))
    }

    async fn stat(&mut self, path: &str) -> Result<FileStat, TransportError> {
        let local = self.resolve(TransportOp::Stat, path)?;
        let meta = tokio::fs::metadata(&local)
            .await
            .map_err(|e| TransportError::operation(TransportOp::Stat, path, e))?;
        Ok(FileStat {
            size: meta.len(),
            modified_at: modified_at(&meta),
        })
    }

    async fn read(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        let local = self.resolve(TransportOp::Read, path)?;
        tokio::fs::read(&local)
            .await
            .map_err(|e| TransportError::operation(TransportOp::Read, path, e))
    }

    async fn write(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        let local = self.resolve(TransportOp::Write, path)?;
        tokio::fs::write(&local, data)
            .await
            .map_err(|e| TransportError::operation(TransportOp::Write, path, e))
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        let source = self.resolve(TransportOp::Rename, from)?;
        let target = self.resolve(TransportOp::Rename, to)?;
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| TransportError::operation(TransportOp::Rename, from, e))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }
}
