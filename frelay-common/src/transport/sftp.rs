//! SFTP transport over libssh2.
//!
//! libssh2 is blocking, so every call runs on the blocking pool via
//! `spawn_blocking` with the session shared behind an `Arc<Mutex<_>>`.

use super::{RemoteTransport, TransportError, TransportOp};
use crate::types::{Credentials, EntryKind, FileStat, RemoteEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ssh2::{ErrorCode as SshErrorCode, Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// `LIBSSH2_FX_NO_SUCH_FILE`
const FX_NO_SUCH_FILE: i32 = 2;

struct Connection {
    session: Session,
    sftp: Sftp,
}

pub struct SftpTransport {
    connect_timeout: Duration,
    conn: Option<Arc<Mutex<Connection>>>,
}

impl SftpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            conn: None,
        }
    }

    async fn blocking<T, F>(&self, op: TransportOp, path: &str, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> std::io::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone().ok_or(TransportError::NotConnected)?;
        let owned_path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                TransportError::operation(op, &owned_path, "session lock poisoned")
            })?;
            f(&guard).map_err(|e| TransportError::operation(op, &owned_path, e))
        })
        .await
        .map_err(|e| TransportError::operation(op, path, e))?
    }
}

fn open_session(
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Connection, TransportError> {
    let connect_err = |message: String| TransportError::Connect {
        host: credentials.host.clone(),
        port: credentials.port,
        message,
    };

    let addr = (credentials.host.as_str(), credentials.port)
        .to_socket_addrs()
        .map_err(|e| connect_err(format!("resolve failed: {}", e)))?
        .next()
        .ok_or_else(|| connect_err("host resolved to no addresses".to_string()))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| connect_err(e.to_string()))?;
    tcp.set_read_timeout(Some(timeout))
        .and_then(|()| tcp.set_write_timeout(Some(timeout)))
        .map_err(|e| connect_err(e.to_string()))?;

    let mut session = Session::new().map_err(|e| connect_err(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
    session
        .handshake()
        .map_err(|e| connect_err(format!("SSH handshake failed: {}", e)))?;

    let auth_err = |message: String| TransportError::Auth {
        host: credentials.host.clone(),
        username: credentials.username.clone(),
        message,
    };
    session
        .userauth_password(&credentials.username, &credentials.password)
        .map_err(|e| auth_err(e.to_string()))?;
    if !session.authenticated() {
        return Err(auth_err("server rejected password".to_string()));
    }

    let sftp = session
        .sftp()
        .map_err(|e| connect_err(format!("SFTP subsystem unavailable: {}", e)))?;
    Ok(Connection { session, sftp })
}

fn mtime_to_utc(mtime: Option<u64>) -> DateTime<Utc> {
    mtime
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn entry_kind(stat: &ssh2::FileStat) -> EntryKind {
    let file_type = stat.file_type();
    if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

#[async_trait]
impl RemoteTransport for SftpTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        let creds = credentials.clone();
        let timeout = self.connect_timeout;
        let conn = tokio::task::spawn_blocking(move || open_session(&creds, timeout))
            .await
            .map_err(|e| TransportError::Connect {
                host: credentials.host.clone(),
                port: credentials.port,
                message: e.to_string(),
            })??;

        info!(
            host = %credentials.host,
            port = credentials.port,
            username = %credentials.username,
            "SFTP session established"
        );
        self.conn = Some(Arc::new(Mutex::new(conn)));
        Ok(())
    }

    async fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let remote = dir.to_string();
        let entries = self
            .blocking(TransportOp::List, dir, move |c| {
                Ok(c.sftp.readdir(Path::new(&remote))?)
            })
            .await?;

        let entries: Vec<RemoteEntry> = entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(RemoteEntry {
                    name,
                    kind: entry_kind(&stat),
                    size: stat.size.unwrap_or(0),
                    modified_at: mtime_to_utc(stat.mtime),
                })
            })
            .collect();
        debug!(dir, count = entries.len(), "Listed remote directory");
        Ok(entries)
    }

    async fn exists(&mut self, path: &str) -> Result<bool, TransportError> {
        let remote = path.to_string();
        self.blocking(TransportOp::Exists, path, move |c| {
            match c.sftp.stat(Path::new(&remote)) {
                Ok(_) => Ok(true),
                Err(e) if e.code() == SshErrorCode::SFTP(FX_NO_SUCH_FILE) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn stat(&mut self, path: &str) -> Result<FileStat, TransportError> {
        let remote = path.to_string();
        self.blocking(TransportOp::Stat, path, move |c| {
            let stat = c.sftp.stat(Path::new(&remote))?;
            Ok(FileStat {
                size: stat.size.unwrap_or(0),
                modified_at: mtime_to_utc(stat.mtime),
            })
        })
        .await
    }

    async fn read(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        let remote = path.to_string();
        self.blocking(TransportOp::Read, path, move |c| {
            let mut file = c.sftp.open(Path::new(&remote))?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Ok(data)
        })
        .await
    }

    async fn write(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        let remote = path.to_string();
        let data = data.to_vec();
        self.blocking(TransportOp::Write, path, move |c| {
            let mut file = c.sftp.create(Path::new(&remote))?;
            file.write_all(&data)?;
            file.flush()
        })
        .await
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        let (source, target) = (from.to_string(), to.to_string());
        self.blocking(TransportOp::Rename, from, move |c| {
            Ok(c.sftp.rename(Path::new(&source), Path::new(&target), None)?)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.conn.is_none() {
            return Ok(());
        }
        let result = self
            .blocking(TransportOp::Close, "", |c| {
                Ok(c.session.disconnect(None, "frelay run finished", None)?)
            })
            .await;
        self.conn = None;
        result
    }
}
