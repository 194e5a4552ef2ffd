use chrono::Utc;
use frelay_common::{LocalTransport, MockClock, MockSyncApi};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use super::common::{RelayHarness, assert_path_exists, init_test_logging};

#[tokio::test]
async fn test_relay_against_local_tree() {
    init_test_logging();
    crate::test_log!("TEST START: test_relay_against_local_tree");

    let root = tempfile::tempdir().unwrap();
    for dir in ["exports/archive", "imports"] {
        fs::create_dir_all(root.path().join(dir)).unwrap();
    }
    let token = Utc::now().format("%m%d%Y").to_string();
    let name = format!("current_month_{}.csv", token);
    fs::write(root.path().join("exports").join(&name), "id,total\n7,70\n").unwrap();
    fs::write(root.path().join("exports/notes.txt"), "ignored").unwrap();

    let mut harness = RelayHarness::new(&["current_month"]);
    harness.config.sync.poll_interval = Duration::from_millis(1);
    harness.clock = MockClock::at(Utc::now());
    let api = MockSyncApi::always_succeeds();

    let result = harness
        .orchestrator_with(LocalTransport::new(root.path()), Arc::new(api.clone()))
        .execute()
        .await;

    assert!(result.success, "{:?}", result);
    assert_path_exists(&root.path().join("exports/archive").join(&name));
    assert!(!root.path().join("exports").join(&name).exists());
    assert_eq!(
        fs::read_to_string(root.path().join("imports/latest.csv")).unwrap(),
        "id,total\n7,70\n"
    );
    assert_path_exists(&root.path().join("exports/notes.txt"));
    assert_eq!(api.trigger_calls(), 1);

    crate::test_log!("TEST PASS: test_relay_against_local_tree");
}

#[tokio::test]
async fn test_missing_local_root_aborts_run() {
    init_test_logging();

    let root = tempfile::tempdir().unwrap();
    let harness = RelayHarness::new(&["current_month"]);
    let result = harness
        .orchestrator_with(
            LocalTransport::new(root.path().join("absent")),
            Arc::new(MockSyncApi::always_succeeds()),
        )
        .execute()
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("Failed to connect"));
    assert_eq!(harness.publisher.count(), 1);
}
