//! CLI entry point for jd-mobile.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use jd_mobile_core::ConfigManager;
use tracing::debug;

mod cli;
mod commands;

use cli::{Args, Command, ConfigCommand, LinkgrabberCommand};

/// Process exit outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
    /// The config is incomplete; run `setup` first.
    NeedsSetup,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::NeedsSetup => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON result; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let manager = ConfigManager::from_env(args.config.as_deref());
    debug!(path = %manager.path().display(), "Resolved config path");

    let exit = match &args.command {
        Command::Config { command } => match command {
            ConfigCommand::Show => commands::run_config_show_command(&manager)?,
            ConfigCommand::Validate => commands::run_config_validate_command(&manager)?,
        },
        Command::Setup(setup_args) => commands::run_setup_command(&manager, setup_args).await?,
        Command::Health => commands::run_health_command(&manager).await?,
        Command::Packages => commands::run_packages_command(&manager).await?,
        Command::Add(add_args) => commands::run_add_command(&manager, add_args).await?,
        Command::Linkgrabber { command } => match command {
            LinkgrabberCommand::List => commands::run_linkgrabber_list_command(&manager).await?,
            LinkgrabberCommand::Start { ids, displayed } => {
                commands::run_linkgrabber_start_command(&manager, ids, displayed.as_deref())
                    .await?
            }
            LinkgrabberCommand::Cancel { ids } => {
                commands::run_linkgrabber_cancel_command(&manager, ids).await?
            }
        },
        Command::Remove(remove_args) => commands::run_remove_command(&manager, remove_args).await?,
    };

    Ok(exit.into())
}
