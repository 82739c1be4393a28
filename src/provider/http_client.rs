//! Shared HTTP client construction for provider and probe calls.
//!
//! Every backend call gets one bounded timeout covering connect and read; no
//! retries happen at this layer.

use std::time::Duration;

use reqwest::Client;

use super::ProviderError;
use crate::config::schema::TIMEOUT_MS_RANGE;
use crate::user_agent;

/// Converts a configured `timeout_ms` into a request timeout, never below the
/// configured minimum.
#[must_use]
pub fn request_timeout(timeout_ms: u64) -> Duration {
    let floor = u64::try_from(*TIMEOUT_MS_RANGE.start()).unwrap_or(100);
    Duration::from_millis(timeout_ms.max(floor))
}

/// Builds a client whose requests fail after `timeout`.
///
/// # Errors
///
/// Returns [`ProviderError::ClientBuild`] when the TLS backend or system
/// configuration cannot be initialized.
pub fn build_http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .user_agent(user_agent::default_user_agent())
        .build()
        .map_err(ProviderError::ClientBuild)
}
