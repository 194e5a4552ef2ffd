//! Core library for frelay.
//!
//! frelay picks today's export files off an SFTP server, copies each one
//! to a fixed destination, archives the source and then drives a
//! downstream sync to completion. Failures are reported to an operator
//! topic.
//!
//! - [`selector`]: which files to relay
//! - [`pipeline`]: validate, copy and archive one file
//! - [`sync`]: trigger and poll the downstream sync
//! - [`orchestrator`]: one full run with per-file failure isolation
//! - [`notify`]: best-effort operator notifications

pub mod clock;
pub mod config;
pub mod errors;
pub mod notify;
pub mod orchestrator;
pub mod pipeline;
pub mod selector;
pub mod sync;
pub mod transport;
pub mod types;
pub mod util;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::{ConfigError, LoadedConfig, RelayConfig};
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry, RelayError};
pub use notify::{LogPublisher, NotificationPublisher, Notifier, RecordingPublisher, SnsPublisher};
pub use orchestrator::SyncOrchestrator;
pub use pipeline::FileTransferPipeline;
pub use selector::{Selection, select};
pub use sync::{HttpSyncApi, MockSyncApi, PollPolicy, SyncApi, SyncRunner, SyncStatus};
pub use transport::{
    LocalTransport, MockTransport, RemoteTransport, SftpTransport, TransportError, TransportOp,
};
pub use types::{
    Credentials, EntryKind, FileOutcome, FileStat, RemoteEntry, RunResult, SyncJobState,
};
