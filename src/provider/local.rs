//! Adapter for the downloader's local HTTP API.
//!
//! Every call is a single `GET {base}/{namespace}/{method}` whose query
//! parameters are individually JSON-encoded. Responses carry their payload
//! under `data`.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::http_client::{build_http_client, request_timeout};
use super::model::{AddLinksRequest, DownloadPackage, LinkgrabberLink};
use super::{Provider, ProviderError, ProviderKind};
use crate::config::normalize::{is_valid_http_url, normalize_base_url};

const QUERY_PACKAGES: &str = "downloadsV2/queryPackages";
const ADD_LINKS: &str = "linkgrabberv2/addLinks";
const QUERY_LINKS: &str = "linkgrabberv2/queryLinks";
const MOVE_TO_DOWNLOADLIST: &str = "linkgrabberv2/moveToDownloadlist";
const REMOVE_LINKGRABBER_LINKS: &str = "linkgrabberv2/removeLinks";
const REMOVE_DOWNLOAD_LINKS: &str = "downloadsV2/removeLinks";
const CLEANUP_DOWNLOADS: &str = "downloadsV2/cleanup";

/// Provider backed by the local API of a reachable downloader.
pub struct LocalProvider {
    client: Client,
    base_url: Url,
}

impl LocalProvider {
    /// Creates a provider for `base_url` with a per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidEndpoint`] for anything but an absolute
    /// http(s) URL, or [`ProviderError::ClientBuild`] if the client cannot be
    /// built.
    #[tracing::instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, ProviderError> {
        let normalized = normalize_base_url(base_url);
        if !is_valid_http_url(&normalized) {
            return Err(ProviderError::InvalidEndpoint {
                base_url: base_url.to_string(),
            });
        }
        // Trailing slash so `join` appends instead of replacing the last segment.
        let base_url = Url::parse(&format!("{normalized}/")).map_err(|_| {
            ProviderError::InvalidEndpoint {
                base_url: base_url.to_string(),
            }
        })?;
        let client = build_http_client(request_timeout(timeout_ms))?;
        Ok(Self { client, base_url })
    }

    /// Base URL without the trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Builds the request URL for `path` with JSON-encoded parameters.
    pub(crate) fn endpoint(&self, path: &str, params: &[(&str, Value)]) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|_| ProviderError::InvalidEndpoint {
                base_url: self.base_url().to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, &value.to_string());
            }
        }
        Ok(url)
    }

    async fn call(&self, path: &str, params: &[(&str, Value)]) -> Result<Value, ProviderError> {
        let url = self.endpoint(path, params)?;
        debug!(url = %url, "Calling downloader API");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(path, status = status.as_u16(), "Downloader API returned error status");
            return Err(ProviderError::http_status(url.as_str(), status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(url.as_str(), e))?;
        Ok(parse_body(&text))
    }

    async fn query_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Value,
    ) -> Result<Vec<T>, ProviderError> {
        let body = self.call(path, &[("query", query)]).await?;
        data_array(path, body)
    }

    async fn selection_action(
        &self,
        path: &str,
        link_ids: &[i64],
        package_ids: &[i64],
        extra: &[(&str, Value)],
    ) -> Result<Value, ProviderError> {
        let mut params = vec![("linkIds", json!(link_ids)), ("packageIds", json!(package_ids))];
        params.extend(extra.iter().cloned());
        self.call(path, &params).await
    }
}

impl std::fmt::Debug for LocalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    #[tracing::instrument(skip(self), fields(endpoint = QUERY_PACKAGES))]
    async fn get_packages(&self) -> Result<Vec<DownloadPackage>, ProviderError> {
        self.query_list(QUERY_PACKAGES, DownloadPackage::query()).await
    }

    #[tracing::instrument(skip(self, request), fields(endpoint = ADD_LINKS, package = %request.package_name))]
    async fn add_links(&self, request: &AddLinksRequest) -> Result<Value, ProviderError> {
        self.call(ADD_LINKS, &[("query", request.query())]).await
    }

    #[tracing::instrument(skip(self), fields(endpoint = QUERY_LINKS))]
    async fn get_linkgrabber_links(&self) -> Result<Vec<LinkgrabberLink>, ProviderError> {
        self.query_list(QUERY_LINKS, LinkgrabberLink::query()).await
    }

    #[tracing::instrument(skip(self), fields(endpoint = MOVE_TO_DOWNLOADLIST))]
    async fn start_linkgrabber_downloads(&self, link_ids: &[i64]) -> Result<Value, ProviderError> {
        self.selection_action(MOVE_TO_DOWNLOADLIST, link_ids, &[], &[])
            .await
    }

    #[tracing::instrument(skip(self), fields(endpoint = REMOVE_LINKGRABBER_LINKS))]
    async fn remove_linkgrabber_links(&self, link_ids: &[i64]) -> Result<Value, ProviderError> {
        self.selection_action(REMOVE_LINKGRABBER_LINKS, link_ids, &[], &[])
            .await
    }

    #[tracing::instrument(skip(self), fields(endpoint = REMOVE_DOWNLOAD_LINKS))]
    async fn remove_packages(&self, package_ids: &[i64]) -> Result<Value, ProviderError> {
        self.selection_action(REMOVE_DOWNLOAD_LINKS, &[], package_ids, &[])
            .await
    }

    #[tracing::instrument(skip(self), fields(endpoint = CLEANUP_DOWNLOADS))]
    async fn cleanup_packages(&self, package_ids: &[i64]) -> Result<Value, ProviderError> {
        self.selection_action(
            CLEANUP_DOWNLOADS,
            &[],
            package_ids,
            &[
                ("action", json!("DELETE_ALL")),
                ("mode", json!("REMOVE_LINKS_AND_DELETE_FILES")),
                ("selectionType", json!("SELECTED")),
            ],
        )
        .await
    }
}

/// Parses a response body, wrapping non-JSON text as `{"data": text}`.
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "data": text }))
}

/// Extracts and deserializes the `data` array. Missing or null `data` is an
/// empty list.
fn data_array<T: DeserializeOwned>(path: &str, body: Value) -> Result<Vec<T>, ProviderError> {
    let data = match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        // Some builds answer list queries with a bare array.
        array @ Value::Array(_) => array,
        _ => return Err(ProviderError::malformed(path, "response is not a JSON object")),
    };
    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(data)
            .map_err(|e| ProviderError::malformed(path, format!("unexpected item shape: {e}"))),
        _ => Err(ProviderError::malformed(path, "data is not an array")),
    }
}
