use chrono::Duration;
use frelay_common::sync::SyncApiCall;
use frelay_common::transport::{MockFault, TransportCall};
use frelay_common::{SyncJobState, SyncStatus, TransportError, TransportOp};
use serde_json::Value;

use super::common::{RelayHarness, assert_contains, dated, init_test_logging};

const FOUR: [&str; 4] = ["file1", "file2", "file3", "file4"];

fn seed_four(harness: &RelayHarness) {
    for (i, prefix) in FOUR.iter().enumerate() {
        harness.add_source(
            &dated(prefix),
            &format!("id,value\n{},{}\n", i, prefix),
            Duration::hours(1),
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_all_files_relayed() {
    init_test_logging();
    crate::test_log!("TEST START: test_all_files_relayed");

    let harness = RelayHarness::new(&["current_month", "prior_month"]);
    harness.add_source(&dated("current_month"), "a,b\n1,2\n", Duration::hours(2));
    harness.add_source(&dated("prior_month"), "a,b\n3,4\n", Duration::hours(1));
    harness.add_source("current_month_01012020.csv", "old", Duration::hours(1));

    let result = harness.orchestrator().execute().await;

    assert!(result.success);
    assert!(!result.partial_failure);
    assert_eq!(result.outcomes.len(), 2);
    assert_contains(&result.message, "2 file(s)");

    for name in [dated("current_month"), dated("prior_month")] {
        assert!(!harness.transport.has_file(&RelayHarness::source_path(&name)));
        assert!(harness.transport.has_file(&RelayHarness::archive_path(&name)));
    }
    // Each file overwrites the fixed destination; the last one stays.
    assert_eq!(
        harness.transport.file(&RelayHarness::dest_path()).unwrap(),
        b"a,b\n3,4\n"
    );
    assert!(harness.transport.has_file("/exports/current_month_01012020.csv"));

    assert_eq!(harness.api.trigger_calls(), 2);
    assert_eq!(harness.publisher.count(), 0);
    assert_eq!(harness.transport.close_count(), 1);

    crate::test_log!("TEST PASS: test_all_files_relayed");
}

#[tokio::test(start_paused = true)]
async fn test_one_pipeline_failure_is_partial() {
    init_test_logging();
    crate::test_log!("TEST START: test_one_pipeline_failure_is_partial");

    let harness = RelayHarness::new(&FOUR);
    seed_four(&harness);
    harness.transport.fail_on(TransportOp::Read, &dated("file2"));

    let result = harness.orchestrator().execute().await;

    assert!(result.success);
    assert!(result.partial_failure);
    assert_eq!(result.failed_filenames, vec![dated("file2")]);
    assert_eq!(
        result
            .outcomes
            .iter()
            .map(|o| o.succeeded)
            .collect::<Vec<_>>(),
        vec![true, false, true, true]
    );

    // The failed file stays in place; the others move on.
    assert!(
        harness
            .transport
            .has_file(&RelayHarness::source_path(&dated("file2")))
    );
    assert!(
        harness
            .transport
            .has_file(&RelayHarness::archive_path(&dated("file4")))
    );

    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert_contains(
        &published[0].message,
        &format!("Processing file {}", dated("file2")),
    );
    assert_eq!(harness.api.trigger_calls(), 3);
    assert_eq!(harness.transport.close_count(), 1);

    crate::test_log!("TEST PASS: test_one_pipeline_failure_is_partial");
}

#[tokio::test(start_paused = true)]
async fn test_all_files_failing_is_total_failure() {
    init_test_logging();
    crate::test_log!("TEST START: test_all_files_failing_is_total_failure");

    let harness = RelayHarness::new(&FOUR);
    for prefix in FOUR {
        harness.add_source(&dated(prefix), "", Duration::hours(1));
    }

    let result = harness.orchestrator().execute().await;

    assert!(!result.success);
    assert!(!result.partial_failure);
    assert_eq!(result.failed_filenames.len(), 4);
    assert!(result.error.is_none());

    let published = harness.publisher.published();
    assert_eq!(published.len(), 4);
    for (notification, prefix) in published.iter().zip(FOUR) {
        assert_contains(
            &notification.message,
            &format!("Processing file {}", dated(prefix)),
        );
        assert_contains(&notification.message, "FRELAY-E201");
    }
    assert_eq!(harness.api.trigger_calls(), 0);
    assert_eq!(harness.transport.close_count(), 1);

    crate::test_log!("TEST PASS: test_all_files_failing_is_total_failure");
}

#[tokio::test(start_paused = true)]
async fn test_selection_failure_closes_once_and_notifies_once() {
    init_test_logging();
    crate::test_log!("TEST START: test_selection_failure_closes_once_and_notifies_once");

    let harness = RelayHarness::new(&["current_month"]);
    harness.add_source("unrelated_10152026.csv", "x", Duration::hours(1));
    harness.add_source("current_month_01012020.csv", "x", Duration::hours(1));

    let result = harness.orchestrator().execute().await;

    assert!(!result.success);
    assert_eq!(result.message, "Sync failed");
    assert_contains(result.error.as_deref().unwrap(), "No files found");
    assert!(result.outcomes.is_empty());
    assert_eq!(harness.transport.close_count(), 1);

    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert_contains(&published[0].message, "FRELAY-E100");
    let details = published[0]
        .message
        .split("Details:\n")
        .nth(1)
        .expect("notification carries details");
    let extra: Value = serde_json::from_str(details.trim()).unwrap();
    assert_eq!(extra["candidates"][0], "unrelated_10152026.csv");
    assert_eq!(extra["patterns"][0], "current_month");

    crate::test_log!("TEST PASS: test_selection_failure_closes_once_and_notifies_once");
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_still_closes() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    harness.transport.inject_fault(MockFault::new(
        TransportOp::Connect,
        None,
        TransportError::Auth {
            host: "sftp.test".to_string(),
            username: "relay".to_string(),
            message: "password rejected".to_string(),
        },
    ));

    let result = harness.orchestrator().execute().await;

    assert!(!result.success);
    assert_contains(result.error.as_deref().unwrap(), "Authentication failed");
    assert!(harness.transport.calls_of(TransportOp::List).is_empty());
    assert_eq!(harness.transport.close_count(), 1);

    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert_contains(&published[0].message, "Context: Connecting to sftp.test:22");
    assert_contains(&published[0].message, "FRELAY-E211");
}

#[tokio::test(start_paused = true)]
async fn test_sync_failure_marks_file_failed_after_archive() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month", "prior_month"]);
    harness.add_source(&dated("current_month"), "a\n1\n", Duration::hours(1));
    harness.add_source(&dated("prior_month"), "a\n2\n", Duration::hours(1));
    harness.api.push_status(Ok(
        SyncStatus::new(SyncJobState::Failed).with_detail("warehouse unavailable")
    ));

    let result = harness.orchestrator().execute().await;

    assert!(result.success);
    assert!(result.partial_failure);
    assert_eq!(result.failed_filenames, vec![dated("current_month")]);
    assert_eq!(
        result.outcomes[0].error_code.as_deref(),
        Some("FRELAY-E302")
    );
    // The copy completed before the sync failed, so the file was archived.
    assert!(
        harness
            .transport
            .has_file(&RelayHarness::archive_path(&dated("current_month")))
    );
    assert_eq!(
        harness.api.calls().first(),
        Some(&SyncApiCall::Trigger("sync-42".to_string()))
    );
    assert_eq!(harness.publisher.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_file_never_archived() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    harness.add_source(&dated("current_month"), "a\n1\n", Duration::hours(30));

    let result = harness.orchestrator().execute().await;

    assert!(!result.success);
    assert_eq!(
        result.outcomes[0].error_code.as_deref(),
        Some("FRELAY-E202")
    );
    assert!(harness.transport.calls_of(TransportOp::Rename).is_empty());
    assert!(harness.transport.calls_of(TransportOp::Write).is_empty());
    assert_eq!(harness.api.trigger_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_error_does_not_change_result() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    harness.add_source(&dated("current_month"), "a\n1\n", Duration::hours(1));
    harness.transport.inject_fault(MockFault::new(
        TransportOp::Close,
        None,
        TransportError::operation(TransportOp::Close, "", "connection reset"),
    ));

    let result = harness.orchestrator().execute().await;

    assert!(result.success);
    assert!(!result.partial_failure);
    assert_eq!(harness.transport.close_count(), 1);
    assert_eq!(harness.publisher.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_call_order_for_single_file() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    let name = dated("current_month");
    harness.add_source(&name, "a\n1\n", Duration::hours(1));

    harness.orchestrator().execute().await;

    let source = RelayHarness::source_path(&name);
    assert_eq!(
        harness.transport.calls(),
        vec![
            TransportCall::Connect {
                host: "sftp.test".to_string()
            },
            TransportCall::List {
                dir: "/exports".to_string()
            },
            TransportCall::Exists {
                path: source.clone()
            },
            TransportCall::Stat {
                path: source.clone()
            },
            TransportCall::Read {
                path: source.clone()
            },
            TransportCall::Write {
                path: RelayHarness::dest_path(),
                len: 4
            },
            TransportCall::Rename {
                from: source,
                to: RelayHarness::archive_path(&name)
            },
            TransportCall::Close,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_yesterday_file_selected_after_midnight() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    harness
        .clock
        .set(super::common::reference_time() - Duration::hours(9) + Duration::minutes(5));
    // 00:05 on the 15th; the file is stamped the 14th and 20 minutes old.
    harness.transport.add_file(
        &RelayHarness::source_path("current_month_10142026.csv"),
        "a\n1\n",
        super::common::reference_time() - Duration::hours(9) - Duration::minutes(15),
    );

    let result = harness.orchestrator().execute().await;
    assert!(result.success, "{:?}", result);
    assert!(
        harness
            .transport
            .has_file(&RelayHarness::archive_path("current_month_10142026.csv"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_result_json_shape() {
    init_test_logging();

    let harness = RelayHarness::new(&FOUR);
    seed_four(&harness);
    harness.transport.fail_on(TransportOp::Stat, &dated("file3"));

    let result = harness.orchestrator().execute().await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["partialFailure"], true);
    assert_eq!(json["failedFilenames"], serde_json::json!([dated("file3")]));
    assert!(uuid::Uuid::parse_str(json["runId"].as_str().unwrap()).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_notification_time_follows_run_clock() {
    init_test_logging();

    let harness = RelayHarness::new(&["current_month"]);
    harness.add_source(&dated("current_month"), "", Duration::hours(1));
    harness
        .clock
        .set(super::common::reference_time() + Duration::minutes(30));

    harness.orchestrator().execute().await;

    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert_contains(&published[0].message, "Time: 2026-10-15T09:30:00.000Z");
}
