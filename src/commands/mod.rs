//! CLI command handlers.
//!
//! Every handler loads the config fresh, prints one JSON document on stdout
//! and returns the process exit outcome.

mod config;
mod health;
mod linkgrabber;
mod packages;
mod setup;

pub use config::{run_config_show_command, run_config_validate_command};
pub use health::run_health_command;
pub use linkgrabber::{
    run_linkgrabber_cancel_command, run_linkgrabber_list_command, run_linkgrabber_start_command,
};
pub use packages::{run_add_command, run_packages_command, run_remove_command};
pub use setup::run_setup_command;

use anyhow::{Context, Result};
use jd_mobile_core::{ConfigManager, Provider, ProviderError, active_provider};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::ProcessExit;

/// Prints `value` as pretty JSON on stdout.
fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{text}");
    Ok(())
}

/// Loads the config and builds the active provider.
///
/// Returns `None` after printing the diagnostics when setup is still needed.
fn open_provider(manager: &ConfigManager) -> Result<Option<Box<dyn Provider>>> {
    let load = manager.load();
    match active_provider(&load) {
        Ok(provider) => Ok(Some(provider)),
        Err(ProviderError::NeedsSetup) => {
            info!("Config requires setup; run `jd-mobile setup --base-url <URL>` first");
            print_json(&json!({
                "ok": false,
                "needs_setup": true,
                "config_path": load.path.display().to_string(),
                "errors": load.error_messages(),
            }))?;
            Ok(None)
        }
        Err(error) => Err(error).context("cannot use the active instance"),
    }
}

/// Reports a failed provider call as `{ok: false, error}`.
fn report_call_failure(action: &str, error: &ProviderError) -> Result<ProcessExit> {
    warn!(error = %error, "{action} failed");
    print_json(&json!({
        "ok": false,
        "error": format!("{action} failed: {error}"),
    }))?;
    Ok(ProcessExit::Failure)
}
