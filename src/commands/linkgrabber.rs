//! LinkGrabber command handlers: list, start a selection, cancel.

use anyhow::Result;
use jd_mobile_core::{ConfigManager, ProviderError, start_selection};
use serde_json::json;

use super::{open_provider, print_json, report_call_failure};
use crate::ProcessExit;

pub async fn run_linkgrabber_list_command(manager: &ConfigManager) -> Result<ProcessExit> {
    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };
    match provider.get_linkgrabber_links().await {
        Ok(links) => {
            print_json(&json!({"ok": true, "links": links}))?;
            Ok(ProcessExit::Success)
        }
        Err(error) => report_call_failure("Fetching LinkGrabber links", &error),
    }
}

pub async fn run_linkgrabber_start_command(
    manager: &ConfigManager,
    ids: &[i64],
    displayed: Option<&[i64]>,
) -> Result<ProcessExit> {
    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };

    let displayed = match displayed {
        Some(displayed) => displayed.to_vec(),
        None => match provider.get_linkgrabber_links().await {
            Ok(links) => links.iter().map(|link| link.uuid).collect(),
            Err(error) => return report_call_failure("Fetching LinkGrabber links", &error),
        },
    };

    match start_selection(provider.as_ref(), ids, &displayed).await {
        Ok(_) => {
            print_json(&json!({
                "ok": true,
                "message": format!("Started downloading {} file(s).", ids.len()),
                "started": ids,
            }))?;
            Ok(ProcessExit::Success)
        }
        Err(ProviderError::EmptySelection) => {
            print_json(&json!({"ok": false, "error": "No files selected."}))?;
            Ok(ProcessExit::Failure)
        }
        Err(error) => report_call_failure("Starting downloads", &error),
    }
}

pub async fn run_linkgrabber_cancel_command(
    manager: &ConfigManager,
    ids: &[i64],
) -> Result<ProcessExit> {
    let Some(provider) = open_provider(manager)? else {
        return Ok(ProcessExit::NeedsSetup);
    };

    let ids = if ids.is_empty() {
        match provider.get_linkgrabber_links().await {
            Ok(links) => links.iter().map(|link| link.uuid).collect(),
            Err(error) => return report_call_failure("Fetching LinkGrabber links", &error),
        }
    } else {
        ids.to_vec()
    };

    if !ids.is_empty()
        && let Err(error) = provider.remove_linkgrabber_links(&ids).await
    {
        return report_call_failure("Cancelling links", &error);
    }
    print_json(&json!({
        "ok": true,
        "message": "LinkGrabber links discarded.",
        "discarded": ids,
    }))?;
    Ok(ProcessExit::Success)
}
