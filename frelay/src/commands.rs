//! Subcommand implementations.

use crate::{CheckConfigArgs, EXIT_CONFIG, RunArgs};
use anyhow::{Context, Result};
use frelay_common::config::{ConfigEntry, ConfigError};
use frelay_common::{
    HttpSyncApi, LocalTransport, LogPublisher, NotificationPublisher, RelayConfig,
    RemoteTransport, RunResult, SftpTransport, SnsPublisher, SyncOrchestrator, SystemClock,
};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

pub fn print_config_error(err: &ConfigError) {
    let entry = err.code().entry();
    eprintln!("Configuration error [{}]: {}", entry.code, err);
    if !entry.remediation.is_empty() {
        eprintln!("Remediation steps:");
        for (i, step) in entry.remediation.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, step);
        }
    }
}

fn load(overrides: HashMap<String, String>) -> Option<(RelayConfig, Vec<ConfigEntry>)> {
    match RelayConfig::load(overrides) {
        Ok(loaded) => Some((loaded.config, loaded.entries)),
        Err(e) => {
            print_config_error(&e);
            None
        }
    }
}

pub async fn run(args: RunArgs, overrides: HashMap<String, String>) -> Result<ExitCode> {
    let Some((config, _)) = load(overrides) else {
        return Ok(ExitCode::from(EXIT_CONFIG));
    };

    let api = HttpSyncApi::from_settings(&config.sync).context("Failed to set up sync API client")?;

    let publisher: Arc<dyn NotificationPublisher> = if args.log_notifications {
        Arc::new(LogPublisher)
    } else {
        Arc::new(SnsPublisher::from_env().await)
    };

    let transport: Box<dyn RemoteTransport> = match &args.local_root {
        Some(root) => {
            info!(root = %root.display(), "Using local directory instead of SFTP");
            Box::new(LocalTransport::new(root.clone()))
        }
        None => Box::new(SftpTransport::new(config.sftp.connect_timeout)),
    };

    let mut orchestrator = SyncOrchestrator::new(
        &config,
        transport,
        Arc::new(api),
        publisher,
        Arc::new(SystemClock),
    );
    let result = orchestrator.execute().await;

    print_result(&result, args.json)?;
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &RunResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let status = match (result.success, result.partial_failure) {
        (true, false) => "OK",
        (true, true) => "PARTIAL",
        (false, _) => "FAILED",
    };
    println!("[{}] {}", status, result.message);
    println!("Run: {}", result.run_id);
    for outcome in &result.outcomes {
        match &outcome.error {
            None => println!("  ok    {}", outcome.filename),
            Some(error) => println!(
                "  fail  {} [{}] {}",
                outcome.filename,
                outcome.error_code.as_deref().unwrap_or("-"),
                error
            ),
        }
    }
    if let Some(error) = &result.error {
        println!("Error: {}", error);
    }
    Ok(())
}

pub fn check_config(args: CheckConfigArgs, overrides: HashMap<String, String>) -> Result<ExitCode> {
    let Some((_, entries)) = load(overrides) else {
        return Ok(ExitCode::from(EXIT_CONFIG));
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(ExitCode::SUCCESS);
    }

    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    println!("Configuration OK");
    for entry in &entries {
        println!(
            "  {:width$}  {}  ({})",
            entry.name,
            entry.value,
            entry.source,
            width = width
        );
    }
    Ok(ExitCode::SUCCESS)
}
