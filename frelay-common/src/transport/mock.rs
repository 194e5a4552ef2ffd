//! In-memory transport for deterministic tests.
//!
//! Clones share state, so a test can hand one handle to the orchestrator and
//! keep another to seed files, inject faults and inspect the call log.

use super::{RemoteTransport, TransportError, TransportOp};
use crate::types::{Credentials, EntryKind, FileStat, RemoteEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One call received by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect { host: String },
    List { dir: String },
    Exists { path: String },
    Stat { path: String },
    Read { path: String },
    Write { path: String, len: usize },
    Rename { from: String, to: String },
    Close,
}

impl TransportCall {
    pub fn op(&self) -> TransportOp {
        match self {
            Self::Connect { .. } => TransportOp::Connect,
            Self::List { .. } => TransportOp::List,
            Self::Exists { .. } => TransportOp::Exists,
            Self::Stat { .. } => TransportOp::Stat,
            Self::Read { .. } => TransportOp::Read,
            Self::Write { .. } => TransportOp::Write,
            Self::Rename { .. } => TransportOp::Rename,
            Self::Close => TransportOp::Close,
        }
    }
}

/// A scripted failure: `op` on a path containing `path_contains` fails.
#[derive(Debug, Clone)]
pub struct MockFault {
    pub op: TransportOp,
    /// `None` matches every path.
    pub path_contains: Option<String>,
    pub error: TransportError,
}

impl MockFault {
    pub fn new(op: TransportOp, path_contains: Option<&str>, error: TransportError) -> Self {
        Self {
            op,
            path_contains: path_contains.map(str::to_string),
            error,
        }
    }

    fn matches(&self, op: TransportOp, path: &str) -> bool {
        self.op == op
            && self
                .path_contains
                .as_deref()
                .is_none_or(|needle| path.contains(needle))
    }
}

#[derive(Debug, Clone)]
struct MockFile {
    data: Vec<u8>,
    modified_at: DateTime<Utc>,
}

#[derive(Debug)]
struct MockState {
    files: BTreeMap<String, MockFile>,
    dirs: BTreeSet<String>,
    calls: Vec<TransportCall>,
    faults: Vec<MockFault>,
    connected: bool,
    close_count: u32,
    now: DateTime<Utc>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            calls: Vec::new(),
            faults: Vec::new(),
            connected: false,
            close_count: 0,
            now: Utc::now(),
        }
    }
}

impl MockState {
    fn check(&self, op: TransportOp, path: &str) -> Result<(), TransportError> {
        if let Some(fault) = self.faults.iter().find(|f| f.matches(op, path)) {
            return Err(fault.error.clone());
        }
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn insert_ancestors(dirs: &mut BTreeSet<String>, dir: &str) {
    let mut current = dir;
    while !current.is_empty() && dirs.insert(current.to_string()) && current != "/" {
        current = parent_of(current);
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// In-memory remote file store.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock transport mutex poisoned")
    }

    /// Add or replace a file at `path`.
    pub fn add_file(&self, path: &str, data: impl Into<Vec<u8>>, modified_at: DateTime<Utc>) {
        let mut state = self.state();
        insert_ancestors(&mut state.dirs, parent_of(path));
        state.files.insert(
            path.to_string(),
            MockFile {
                data: data.into(),
                modified_at,
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        let mut state = self.state();
        insert_ancestors(&mut state.dirs, path.trim_end_matches('/'));
    }

    /// Timestamp stamped on files created by `write`.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.state().now = now;
    }

    pub fn inject_fault(&self, fault: MockFault) {
        self.state().faults.push(fault);
    }

    /// Fail `op` on any path containing `path_contains` with a generic message.
    pub fn fail_on(&self, op: TransportOp, path_contains: &str) {
        self.inject_fault(MockFault::new(
            op,
            Some(path_contains),
            TransportError::operation(op, path_contains, "injected failure"),
        ));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).map(|f| f.data.clone())
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.state().files.contains_key(path)
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state().calls.clone()
    }

    /// Calls of one kind, in order.
    pub fn calls_of(&self, op: TransportOp) -> Vec<TransportCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn close_count(&self) -> u32 {
        self.state().close_count
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Connect {
            host: credentials.host.clone(),
        });
        if let Some(fault) = state
            .faults
            .iter()
            .find(|f| f.matches(TransportOp::Connect, &credentials.host))
        {
            return Err(fault.error.clone());
        }
        state.connected = true;
        Ok(())
    }

    async fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::List {
            dir: dir.to_string(),
        });
        state.check(TransportOp::List, dir)?;

        let dir = match dir.trim_end_matches('/') {
            "" if dir.starts_with('/') => "/",
            trimmed => trimmed,
        };
        if !state.dirs.contains(dir) {
            return Err(TransportError::operation(
                TransportOp::List,
                dir,
                "No such directory",
            ));
        }

        let mut entries: Vec<RemoteEntry> = state
            .files
            .iter()
            .filter(|(path, _)| parent_of(path) == dir)
            .map(|(path, file)| {
                RemoteEntry::file(name_of(path), file.data.len() as u64, file.modified_at)
            })
            .collect();
        entries.extend(
            state
                .dirs
                .iter()
                .filter(|sub| sub.as_str() != dir && parent_of(sub) == dir)
                .map(|sub| RemoteEntry {
                    name: name_of(sub).to_string(),
                    kind: EntryKind::Directory,
                    size: 0,
                    modified_at: state.now,
                }),
        );
        Ok(entries)
    }

    async fn exists(&mut self, path: &str) -> Result<bool, TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Exists {
            path: path.to_string(),
        });
        state.check(TransportOp::Exists, path)?;
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    async fn stat(&mut self, path: &str) -> Result<FileStat, TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Stat {
            path: path.to_string(),
        });
        state.check(TransportOp::Stat, path)?;
        state
            .files
            .get(path)
            .map(|f| FileStat {
                size: f.data.len() as u64,
                modified_at: f.modified_at,
            })
            .ok_or_else(|| TransportError::operation(TransportOp::Stat, path, "No such file"))
    }

    async fn read(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Read {
            path: path.to_string(),
        });
        state.check(TransportOp::Read, path)?;
        state
            .files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| TransportError::operation(TransportOp::Read, path, "No such file"))
    }

    async fn write(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Write {
            path: path.to_string(),
            len: data.len(),
        });
        state.check(TransportOp::Write, path)?;
        if !state.dirs.contains(parent_of(path)) {
            return Err(TransportError::operation(
                TransportOp::Write,
                path,
                "Parent directory does not exist",
            ));
        }
        let modified_at = state.now;
        state.files.insert(
            path.to_string(),
            MockFile {
                data: data.to_vec(),
                modified_at,
            },
        );
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        state.check(TransportOp::Rename, from)?;
        if !state.dirs.contains(parent_of(to)) {
            return Err(TransportError::operation(
                TransportOp::Rename,
                to,
                "Target directory does not exist",
            ));
        }
        let file = state
            .files
            .remove(from)
            .ok_or_else(|| TransportError::operation(TransportOp::Rename, from, "No such file"))?;
        state.files.insert(to.to_string(), file);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        state.calls.push(TransportCall::Close);
        state.close_count += 1;
        state.connected = false;
        if let Some(fault) = state.faults.iter().find(|f| f.op == TransportOp::Close) {
            return Err(fault.error.clone());
        }
        Ok(())
    }
}
