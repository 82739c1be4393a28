//! Liveness probe against the downloader's `/help` endpoint and the health
//! report built from it.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::normalize::normalize_base_url;
use crate::config::{ConfigLoadResult, ConfigManager};
use crate::provider::{build_http_client, primary_endpoint, request_timeout};

/// Substrings expected somewhere in a genuine `/help` response.
const HELP_KEYWORDS: [&str; 3] = ["jdownloader", "downloads", "linkgrabber"];

/// Message for a reachable endpoint whose body looks unfamiliar.
pub const MISSING_KEYWORDS_MESSAGE: &str =
    "Connected (help endpoint reachable), but response did not contain expected keywords.";

/// Message for a fully successful probe.
pub const CONNECTED_MESSAGE: &str = "Connected.";

/// Result of probing `{base_url}/help`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub ok: bool,
    pub message: String,
}

impl ProbeOutcome {
    fn success(message: &str) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Probes `{base_url}/help` once with the given timeout.
///
/// A 200 response whose body mentions none of the expected keywords still
/// counts as reachable, with a warning message.
#[tracing::instrument(skip_all, fields(base_url = %base_url, timeout_ms = timeout_ms))]
pub async fn probe_help(base_url: &str, timeout_ms: u64) -> ProbeOutcome {
    let base_url = normalize_base_url(base_url);
    if base_url.is_empty() {
        return ProbeOutcome::failure("Base URL is empty.");
    }
    let url = format!("{base_url}/help");

    let client = match build_http_client(request_timeout(timeout_ms)) {
        Ok(client) => client,
        Err(error) => return ProbeOutcome::failure(error.to_string()),
    };

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(error) => {
            debug!(url = %url, error = %error, "Help probe failed");
            return ProbeOutcome::failure(error.to_string());
        }
    };

    let status = response.status().as_u16();
    if status != 200 {
        return ProbeOutcome::failure(format!("HTTP {status} from {url}"));
    }

    let body = match response.text().await {
        Ok(body) => body.to_lowercase(),
        Err(error) => return ProbeOutcome::failure(error.to_string()),
    };
    if HELP_KEYWORDS.iter().any(|keyword| body.contains(keyword)) {
        ProbeOutcome::success(CONNECTED_MESSAGE)
    } else {
        warn!(url = %url, "Help endpoint answered without expected keywords");
        ProbeOutcome::success(MISSING_KEYWORDS_MESSAGE)
    }
}

/// Health of the configured downloader connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_setup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub config_path: PathBuf,
    pub writable: bool,
}

impl HealthReport {
    /// HTTP-style status: 503 while setup is needed, 200 when the probe
    /// succeeded, 502 otherwise.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.needs_setup == Some(true) {
            503
        } else if self.ok {
            200
        } else {
            502
        }
    }
}

/// Builds the health report for a freshly loaded config.
pub async fn health_report(manager: &ConfigManager, load: &ConfigLoadResult) -> HealthReport {
    let writable = manager.is_writable();
    let config_path = load.path.clone();

    if load.needs_setup {
        return HealthReport {
            ok: false,
            needs_setup: Some(true),
            message: None,
            base_url: None,
            config_path,
            writable,
        };
    }

    let (base_url, timeout_ms) = load
        .active_instance()
        .map(primary_endpoint)
        .unwrap_or_default();
    let outcome = probe_help(&base_url, timeout_ms).await;

    HealthReport {
        ok: outcome.ok,
        needs_setup: None,
        message: Some(outcome.message),
        base_url: Some(base_url),
        config_path,
        writable,
    }
}
