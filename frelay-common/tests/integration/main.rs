#[path = "../common/mod.rs"]
mod common;

mod http_sync_tests;
mod local_run_tests;
mod orchestrator_tests;
