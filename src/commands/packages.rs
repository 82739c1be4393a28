//! Download list command handlers: list, add links, remove.

use anyhow::Result;
use jd_mobile_core::{AddLinksRequest, ConfigManager};
use serde_json::json;
use tracing::debug;

use super::{open_provider, print_json, report_call_failure};
use crate::ProcessExit;
use crate::cli::{AddArgs, RemoveArgs};

pub async fn run_packages_command(manager: &ConfigManager) -> Result<ProcessExit> {
    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };
    match provider.get_packages().await {
        Ok(packages) => {
            debug!(count = packages.len(), "Fetched packages");
            print_json(&json!({"ok": true, "packages": packages}))?;
            Ok(ProcessExit::Success)
        }
        Err(error) => report_call_failure("Fetching packages", &error),
    }
}

pub async fn run_add_command(manager: &ConfigManager, args: &AddArgs) -> Result<ProcessExit> {
    let request = AddLinksRequest::new(
        &args.links,
        &args.package,
        args.dest.as_deref(),
        args.autostart,
    )
    .for_file_selection(args.select_files);
    if request.is_empty() {
        print_json(&json!({"ok": false, "error": "Paste one or more links."}))?;
        return Ok(ProcessExit::Failure);
    }

    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };
    match provider.add_links(&request).await {
        Ok(_) => {
            let message = if args.select_files {
                "Links sent to LinkGrabber. Select the files to download with `jd-mobile linkgrabber`."
            } else {
                "Links submitted to LinkGrabber."
            };
            print_json(&json!({
                "ok": true,
                "message": message,
                "package": request.package_name,
                "autostart": request.autostart,
            }))?;
            Ok(ProcessExit::Success)
        }
        Err(error) => report_call_failure("Adding links", &error),
    }
}

pub async fn run_remove_command(manager: &ConfigManager, args: &RemoveArgs) -> Result<ProcessExit> {
    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };
    let ids = [args.id];
    let (result, message) = if args.delete_files {
        (
            provider.cleanup_packages(&ids).await,
            "Package removed and files deleted.",
        )
    } else {
        (
            provider.remove_packages(&ids).await,
            "Package removed (files kept on disk).",
        )
    };
    match result {
        Ok(_) => {
            print_json(&json!({"ok": true, "message": message, "package_id": args.id}))?;
            Ok(ProcessExit::Success)
        }
        Err(error) => report_call_failure("Removing package", &error),
    }
}
