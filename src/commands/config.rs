//! Config command handlers: show and validate the reconciled config.

use anyhow::Result;
use jd_mobile_core::ConfigManager;
use serde_json::json;

use super::print_json;
use crate::ProcessExit;

pub fn run_config_show_command(manager: &ConfigManager) -> Result<ProcessExit> {
    let load = manager.load();
    print_json(&load)?;
    Ok(ProcessExit::Success)
}

pub fn run_config_validate_command(manager: &ConfigManager) -> Result<ProcessExit> {
    let load = manager.load();
    print_json(&json!({
        "ok": load.ok,
        "needs_setup": load.needs_setup,
        "config_path": load.path.display().to_string(),
        "errors": load.errors,
    }))?;
    Ok(if load.ok {
        ProcessExit::Success
    } else if load.needs_setup {
        ProcessExit::NeedsSetup
    } else {
        ProcessExit::Failure
    })
}
