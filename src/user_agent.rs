//! Shared User-Agent string for provider and probe HTTP clients.

/// Default User-Agent for requests to the downloader backend.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("jd-mobile/{version} (local-control)")
}
