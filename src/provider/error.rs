//! Error types for provider operations.

use thiserror::Error;

/// Errors returned by provider construction and provider calls.
///
/// Every per-call failure (network, timeout, status, malformed body) is the
/// same outcome to callers: the call failed and nothing was partially applied.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, reset, or another transport failure.
    #[error("provider call failed: network error calling {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The call did not complete within the configured timeout.
    #[error("provider call failed: timeout calling {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// The backend answered with a non-success status.
    #[error("provider call failed: HTTP {status} from {url}")]
    HttpStatus {
        /// The endpoint that answered.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body could not be interpreted as the expected shape.
    #[error("provider call failed: malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The endpoint that answered.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid provider base URL '{base_url}'")]
    InvalidEndpoint {
        /// The rejected base URL.
        base_url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The configured provider type has no implementation.
    #[error("provider type '{kind}' is not supported yet")]
    Unsupported {
        /// The configured provider type.
        kind: String,
    },

    /// `active_instance_id` does not resolve to an instance.
    #[error("No active instance configured.")]
    NoActiveInstance,

    /// The config must be completed before any provider can be used.
    #[error("config requires setup before the downloader can be reached")]
    NeedsSetup,

    /// A selection-based operation was called with no ids.
    #[error("No links selected.")]
    EmptySelection,
}

impl ProviderError {
    /// Maps a reqwest error into a timeout or network failure.
    #[must_use]
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported provider error.
    #[must_use]
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::Unsupported { kind: kind.into() }
    }

    /// True when a remote call was attempted and failed.
    #[must_use]
    pub fn is_call_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::HttpStatus { .. }
                | Self::MalformedResponse { .. }
        )
    }
}
