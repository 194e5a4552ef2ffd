use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use frelay_common::config::{
    LogSettings, NotifySettings, RelayConfig, SelectionSettings, SftpSettings, SyncSettings,
};
use frelay_common::{
    MockClock, MockSyncApi, MockTransport, RecordingPublisher, RemoteTransport, SyncApi,
    SyncOrchestrator,
};
use std::sync::Arc;

pub const SOURCE_DIR: &str = "/exports";
pub const DEST_DIR: &str = "/imports";
pub const ARCHIVE_DIR: &str = "/exports/archive";
pub const DEST_FILENAME: &str = "latest.csv";
pub const TOPIC: &str = "arn:aws:sns:us-east-1:000000000000:relay-test";

/// 09:00 UTC on 15 Oct 2026; today's token is `10152026`.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap()
}

/// `<prefix>_10152026.csv`
pub fn dated(prefix: &str) -> String {
    format!("{}_10152026.csv", prefix)
}

pub fn test_config(patterns: &[&str]) -> RelayConfig {
    RelayConfig {
        sftp: SftpSettings {
            host: "sftp.test".to_string(),
            port: 22,
            username: "relay".to_string(),
            password: "secret-password".to_string(),
            source_dir: SOURCE_DIR.to_string(),
            dest_dir: DEST_DIR.to_string(),
            archive_dir: ARCHIVE_DIR.to_string(),
            dest_filename: DEST_FILENAME.to_string(),
            connect_timeout: std::time::Duration::from_secs(5),
        },
        sync: SyncSettings {
            api_url: "http://127.0.0.1:1/api/v1".to_string(),
            api_key: "ht_test_key".to_string(),
            sync_id: "sync-42".to_string(),
            poll_interval: std::time::Duration::from_secs(10),
            max_poll_attempts: 30,
            request_timeout: std::time::Duration::from_secs(5),
        },
        selection: SelectionSettings {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            date_format: "%m%d%Y".to_string(),
            utc_offset: FixedOffset::east_opt(0).unwrap(),
            max_age_hours: 24,
        },
        notify: NotifySettings {
            topic_arn: TOPIC.to_string(),
            subject: "SFTP Sync Error".to_string(),
        },
        log: LogSettings {
            level: "debug".to_string(),
            json: false,
        },
    }
}

/// Mock collaborators wired around one relay configuration.
pub struct RelayHarness {
    pub config: RelayConfig,
    pub transport: MockTransport,
    pub api: MockSyncApi,
    pub publisher: RecordingPublisher,
    pub clock: MockClock,
}

impl RelayHarness {
    pub fn new(patterns: &[&str]) -> Self {
        crate::test_log!("FIXTURE: Creating relay harness for {:?}", patterns);

        let transport = MockTransport::new();
        transport.add_dir(SOURCE_DIR);
        transport.add_dir(DEST_DIR);
        transport.add_dir(ARCHIVE_DIR);
        transport.set_now(reference_time());

        Self {
            config: test_config(patterns),
            transport,
            api: MockSyncApi::always_succeeds(),
            publisher: RecordingPublisher::new(),
            clock: MockClock::at(reference_time()),
        }
    }

    /// Seed a source file modified `age` before the reference time.
    pub fn add_source(&self, name: &str, data: &str, age: Duration) {
        self.transport.add_file(
            &format!("{}/{}", SOURCE_DIR, name),
            data,
            reference_time() - age,
        );
    }

    pub fn orchestrator(&self) -> SyncOrchestrator<MockTransport> {
        self.orchestrator_with(self.transport.clone(), Arc::new(self.api.clone()))
    }

    pub fn orchestrator_with<T: RemoteTransport>(
        &self,
        transport: T,
        api: Arc<dyn SyncApi>,
    ) -> SyncOrchestrator<T> {
        SyncOrchestrator::new(
            &self.config,
            transport,
            api,
            Arc::new(self.publisher.clone()),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn source_path(name: &str) -> String {
        format!("{}/{}", SOURCE_DIR, name)
    }

    pub fn archive_path(name: &str) -> String {
        format!("{}/{}", ARCHIVE_DIR, name)
    }

    pub fn dest_path() -> String {
        format!("{}/{}", DEST_DIR, DEST_FILENAME)
    }
}
