//! frelay - scheduled SFTP export relay
//!
//! Picks today's export files off the SFTP server, copies them to the
//! import location, archives the originals and triggers the downstream
//! sync. Intended to run once per schedule tick.

#![forbid(unsafe_code)]

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use frelay_common::config::{EnvParser, load_overrides};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit code when configuration cannot be loaded.
pub const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "frelay")]
#[command(author, version, about = "Relay dated SFTP exports and trigger the downstream sync")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one relay
    Run(RunArgs),

    /// Validate configuration and show where each value came from
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Clone, Default)]
pub struct OverrideArgs {
    /// Load variables from a .env file (wins over --tfvars)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Load variables from a Terraform .tfvars file
    #[arg(long, value_name = "PATH")]
    pub tfvars: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Log notifications instead of publishing them to SNS
    #[arg(long)]
    pub log_notifications: bool,

    /// Use a local directory tree instead of the SFTP server
    #[arg(long, value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Print the resolved settings as JSON
    #[arg(long)]
    pub json: bool,
}

impl Command {
    fn overrides(&self) -> &OverrideArgs {
        match self {
            Self::Run(args) => &args.overrides,
            Self::CheckConfig(args) => &args.overrides,
        }
    }
}

fn init_logging(verbose: bool, json_logs: bool, overrides: &HashMap<String, String>) {
    // Problems with these two are reported by the full config load.
    let mut parser = EnvParser::new().with_overrides(overrides.clone());
    let level = parser.get_log_level("FRELAY_LOG_LEVEL", "info").value;
    let json = json_logs || parser.get_bool("FRELAY_LOG_JSON", false).value;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let paths = cli.command.overrides();
    let overrides = match load_overrides(paths.tfvars.as_deref(), paths.env_file.as_deref()) {
        Ok(overrides) => overrides,
        Err(e) => {
            commands::print_config_error(&e);
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };

    init_logging(cli.verbose, cli.json_logs, &overrides);

    match cli.command {
        Command::Run(args) => commands::run(args, overrides).await,
        Command::CheckConfig(args) => commands::check_config(args, overrides),
    }
}
