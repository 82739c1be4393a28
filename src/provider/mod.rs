//! Downloader backends behind one capability contract.
//!
//! - [`Provider`] - async trait every backend implements
//! - [`LocalProvider`] - the downloader's local HTTP API
//! - [`build_provider`] / [`active_provider`] - construction from config
//!
//! Each provider operation maps to exactly one remote call and either fully
//! succeeds or returns a [`ProviderError`].

mod error;
mod http_client;
mod local;
mod model;

pub use error::ProviderError;
pub use http_client::{build_http_client, request_timeout};
pub use local::LocalProvider;
pub use model::{AddLinksRequest, DEFAULT_PACKAGE_NAME, DownloadPackage, LinkgrabberLink};

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ConfigLoadResult;
use crate::config::schema::{DEFAULT_TIMEOUT_MS, PROVIDER_LOCAL, PROVIDER_MYJD};

/// Backend kinds a provider block may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Local HTTP API on the LAN.
    Local,
    /// Remote relay service. Not implemented.
    MyJd,
}

impl ProviderKind {
    /// Parses a provider `type` string.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unsupported`] for unknown types.
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            PROVIDER_LOCAL => Ok(Self::Local),
            PROVIDER_MYJD => Ok(Self::MyJd),
            other => Err(ProviderError::unsupported(other)),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => PROVIDER_LOCAL,
            Self::MyJd => PROVIDER_MYJD,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations against one downloader backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// All packages in the download list.
    async fn get_packages(&self) -> Result<Vec<DownloadPackage>, ProviderError>;

    /// Submits links to the LinkGrabber.
    async fn add_links(&self, request: &AddLinksRequest) -> Result<Value, ProviderError>;

    /// Links waiting in the LinkGrabber.
    async fn get_linkgrabber_links(&self) -> Result<Vec<LinkgrabberLink>, ProviderError>;

    /// Moves LinkGrabber links to the download list.
    async fn start_linkgrabber_downloads(&self, link_ids: &[i64]) -> Result<Value, ProviderError>;

    /// Drops links from the LinkGrabber.
    async fn remove_linkgrabber_links(&self, link_ids: &[i64]) -> Result<Value, ProviderError>;

    /// Removes packages from the download list, keeping files on disk.
    async fn remove_packages(&self, package_ids: &[i64]) -> Result<Value, ProviderError>;

    /// Removes packages and deletes their files.
    async fn cleanup_packages(&self, package_ids: &[i64]) -> Result<Value, ProviderError>;
}

/// Connection settings read from an instance's primary provider block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ProviderSettings {
    /// Reads `providers.primary` of an instance.
    ///
    /// Missing fields read as empty; a missing or non-positive timeout falls
    /// back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unsupported`] for an unknown provider type.
    pub fn from_instance(instance: &Value) -> Result<Self, ProviderError> {
        let kind = instance["providers"]["primary"]["type"]
            .as_str()
            .unwrap_or(PROVIDER_LOCAL);
        let kind = ProviderKind::parse(kind)?;
        let (base_url, timeout_ms) = primary_endpoint(instance);
        Ok(Self {
            kind,
            base_url,
            timeout_ms,
        })
    }
}

/// `(base_url, timeout_ms)` of an instance's primary provider, whatever its type.
#[must_use]
pub fn primary_endpoint(instance: &Value) -> (String, u64) {
    let primary = &instance["providers"]["primary"];
    let base_url = primary["base_url"]
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string();
    let timeout_ms = primary["timeout_ms"]
        .as_u64()
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS.unsigned_abs());
    (base_url, timeout_ms)
}

/// Builds the provider for `settings`.
///
/// # Errors
///
/// Returns [`ProviderError::Unsupported`] for [`ProviderKind::MyJd`], or the
/// construction error of the local adapter.
pub fn build_provider(settings: &ProviderSettings) -> Result<Box<dyn Provider>, ProviderError> {
    match settings.kind {
        ProviderKind::Local => Ok(Box::new(LocalProvider::new(
            &settings.base_url,
            settings.timeout_ms,
        )?)),
        ProviderKind::MyJd => Err(ProviderError::unsupported(settings.kind.as_str())),
    }
}

/// Builds the provider for the active instance of a loaded config.
///
/// # Errors
///
/// Returns [`ProviderError::NeedsSetup`] while the config is incomplete,
/// [`ProviderError::NoActiveInstance`] when the active id does not resolve, or
/// any [`build_provider`] error.
pub fn active_provider(load: &ConfigLoadResult) -> Result<Box<dyn Provider>, ProviderError> {
    if load.needs_setup {
        return Err(ProviderError::NeedsSetup);
    }
    let instance = load
        .active_instance()
        .ok_or(ProviderError::NoActiveInstance)?;
    let settings = ProviderSettings::from_instance(instance)?;
    debug!(kind = %settings.kind, base_url = %settings.base_url, "Using active provider");
    build_provider(&settings)
}

/// Ids shown to the user but not selected, in display order.
#[must_use]
pub fn unselected_ids(selected: &[i64], displayed: &[i64]) -> Vec<i64> {
    displayed
        .iter()
        .copied()
        .filter(|id| !selected.contains(id))
        .collect()
}

/// Starts the selected LinkGrabber links, discarding the displayed ones that
/// were not selected first.
///
/// # Errors
///
/// Returns [`ProviderError::EmptySelection`] when nothing is selected, or the
/// first failing provider call. If removal fails nothing is started.
pub async fn start_selection(
    provider: &dyn Provider,
    selected: &[i64],
    displayed: &[i64],
) -> Result<Value, ProviderError> {
    if selected.is_empty() {
        return Err(ProviderError::EmptySelection);
    }
    let discard = unselected_ids(selected, displayed);
    if !discard.is_empty() {
        debug!(count = discard.len(), "Removing unselected LinkGrabber links");
        provider.remove_linkgrabber_links(&discard).await?;
    }
    provider.start_linkgrabber_downloads(selected).await
}
