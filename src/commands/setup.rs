//! Setup command handler: probe the endpoint, then save it.

use anyhow::Result;
use jd_mobile_core::{ConfigManager, ManualSetup, SetupError, run_manual_setup};
use serde_json::json;
use tracing::{info, warn};

use super::print_json;
use crate::ProcessExit;
use crate::cli::SetupArgs;

pub async fn run_setup_command(manager: &ConfigManager, args: &SetupArgs) -> Result<ProcessExit> {
    let setup = ManualSetup::new(&args.base_url, args.timeout_ms, &args.name);

    match run_manual_setup(manager, &setup).await {
        Ok(_) => {
            info!(path = %manager.path().display(), "Setup complete");
            print_json(&json!({
                "ok": true,
                "message": "Saved. Connected to JDownloader.",
                "base_url": setup.base_url,
                "config_path": manager.path().display().to_string(),
            }))?;
            Ok(ProcessExit::Success)
        }
        Err(SetupError::ConnectionFailed(message)) => {
            warn!(base_url = %setup.base_url, "Connection test failed");
            print_json(&json!({
                "ok": false,
                "error": format!("Connection test failed: {message}"),
            }))?;
            Ok(ProcessExit::Failure)
        }
        Err(SetupError::Save(error)) => {
            warn!(error = %error, "Setup could not be saved");
            print_json(&json!({
                "ok": false,
                "errors": error.messages(),
            }))?;
            Ok(ProcessExit::Failure)
        }
    }
}
