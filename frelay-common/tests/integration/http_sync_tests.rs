use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::Duration;
use frelay_common::HttpSyncApi;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::common::{RelayHarness, assert_contains, dated, init_test_logging};

#[derive(Clone, Default)]
struct SyncServer {
    triggers: Arc<AtomicU32>,
    polls: Arc<AtomicU32>,
}

async fn trigger(State(server): State<SyncServer>, Path(_id): Path<String>) -> StatusCode {
    server.triggers.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

/// Reports `processing` twice, then `success`.
async fn status(State(server): State<SyncServer>, Path(id): Path<String>) -> String {
    let poll = server.polls.fetch_add(1, Ordering::SeqCst);
    let state = if poll < 2 { "processing" } else { "success" };
    format!(r#"{{"id":"{}","status":"{}"}}"#, id, state)
}

async fn spawn(server: SyncServer) -> String {
    let app = Router::new()
        .route("/api/v1/syncs/{id}/trigger", post(trigger))
        .route("/api/v1/syncs/{id}", get(status))
        .with_state(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

#[tokio::test]
async fn test_run_polls_real_http_endpoint() {
    init_test_logging();
    crate::test_log!("TEST START: test_run_polls_real_http_endpoint");

    let server = SyncServer::default();
    let base = spawn(server.clone()).await;

    let mut harness = RelayHarness::new(&["current_month"]);
    harness.config.sync.poll_interval = std::time::Duration::from_millis(5);
    harness.add_source(&dated("current_month"), "a\n1\n", Duration::hours(1));

    let api = HttpSyncApi::new(base, "ht_test_key", std::time::Duration::from_secs(5)).unwrap();
    let result = harness
        .orchestrator_with(harness.transport.clone(), Arc::new(api))
        .execute()
        .await;

    assert!(result.success, "{:?}", result);
    assert_eq!(server.triggers.load(Ordering::SeqCst), 1);
    assert_eq!(server.polls.load(Ordering::SeqCst), 3);

    crate::test_log!("TEST PASS: test_run_polls_real_http_endpoint");
}

#[tokio::test]
async fn test_unreachable_api_fails_file() {
    init_test_logging();

    let mut harness = RelayHarness::new(&["current_month"]);
    harness.config.sync.poll_interval = std::time::Duration::from_millis(5);
    harness.add_source(&dated("current_month"), "a\n1\n", Duration::hours(1));

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api = HttpSyncApi::new(
        format!("http://127.0.0.1:{}/api/v1", port),
        "ht_test_key",
        std::time::Duration::from_secs(2),
    )
    .unwrap();
    let result = harness
        .orchestrator_with(harness.transport.clone(), Arc::new(api))
        .execute()
        .await;

    assert!(!result.success);
    assert_eq!(
        result.outcomes[0].error_code.as_deref(),
        Some("FRELAY-E300")
    );
    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert_contains(&published[0].message, "Failed to trigger sync sync-42");
}
