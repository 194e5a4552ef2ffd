//! Remote file store access.
//!
//! The relay talks to the remote store only through [`RemoteTransport`].
//! One session is opened per run and owned exclusively by the orchestrator.
//!
//! - [`SftpTransport`]: libssh2 over TCP with password authentication.
//! - [`LocalTransport`]: a local directory tree, for rehearsing a run.
//! - [`MockTransport`]: in-memory store with fault injection, for tests.

pub mod local;
pub mod mock;
pub mod sftp;

pub use local::LocalTransport;
pub use mock::{MockFault, MockTransport, TransportCall};
pub use sftp::SftpTransport;

use crate::errors::ErrorCode;
use crate::types::{Credentials, FileStat, RemoteEntry};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Operation names used in transport errors and call logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOp {
    Connect,
    List,
    Exists,
    Stat,
    Read,
    Write,
    Rename,
    Close,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::List => "list",
            Self::Exists => "exists",
            Self::Stat => "stat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Rename => "rename",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Errors reported by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport session is not connected")]
    NotConnected,

    #[error("Failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Authentication failed for {username}@{host}: {message}")]
    Auth {
        host: String,
        username: String,
        message: String,
    },

    #[error("Remote {op} failed for {path}: {message}")]
    Operation {
        op: TransportOp,
        path: String,
        message: String,
    },
}

impl TransportError {
    pub fn operation(op: TransportOp, path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Operation {
            op,
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connect { .. } => ErrorCode::TransportConnect,
            Self::Auth { .. } => ErrorCode::TransportAuth,
            Self::NotConnected | Self::Operation { .. } => ErrorCode::TransportOperation,
        }
    }
}

/// A session against a remote file store.
///
/// Paths are remote paths joined with `/`. Reads and writes move whole
/// files; there is no partial or resumable transfer.
#[async_trait]
pub trait RemoteTransport: Send {
    /// Open the session.
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError>;

    /// List the entries of `dir` (excluding `.` and `..`).
    async fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError>;

    async fn exists(&mut self, path: &str) -> Result<bool, TransportError>;

    async fn stat(&mut self, path: &str) -> Result<FileStat, TransportError>;

    /// Read the full contents of `path`.
    async fn read(&mut self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Create or truncate `path` and write `data` to it.
    async fn write(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError>;

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError>;

    /// Release the session. Safe to call when `connect` failed.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: RemoteTransport + ?Sized> RemoteTransport for Box<T> {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        (**self).connect(credentials).await
    }

    async fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        (**self).list(dir).await
    }

    async fn exists(&mut self, path: &str) -> Result<bool, TransportError> {
        (**self).exists(path).await
    }

    async fn stat(&mut self, path: &str) -> Result<FileStat, TransportError> {
        (**self).stat(path).await
    }

    async fn read(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).read(path).await
    }

    async fn write(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(path, data).await
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        (**self).rename(from, to).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        (**self).close().await
    }
}
