//! Health command handler.

use anyhow::Result;
use jd_mobile_core::{ConfigManager, health_report};

use super::print_json;
use crate::ProcessExit;

pub async fn run_health_command(manager: &ConfigManager) -> Result<ProcessExit> {
    let load = manager.load();
    let report = health_report(manager, &load).await;
    print_json(&report)?;
    Ok(match report.status_code() {
        200 => ProcessExit::Success,
        503 => ProcessExit::NeedsSetup,
        _ => ProcessExit::Failure,
    })
}
