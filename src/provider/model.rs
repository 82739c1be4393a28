//! Wire models for the downloader's local API.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Package name used when the caller leaves it blank.
pub const DEFAULT_PACKAGE_NAME: &str = "Mobile";

/// A package in the download list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadPackage {
    pub uuid: i64,
    pub name: Option<String>,
    pub bytes_total: Option<i64>,
    pub bytes_loaded: Option<i64>,
    /// Bytes per second.
    pub speed: Option<i64>,
    /// Seconds remaining.
    pub eta: Option<i64>,
    pub enabled: Option<bool>,
    pub running: Option<bool>,
    pub finished: Option<bool>,
}

impl DownloadPackage {
    /// Completion percentage, when the total size is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> Option<f64> {
        let total = self.bytes_total.filter(|total| *total > 0)?;
        let loaded = self.bytes_loaded.unwrap_or(0).clamp(0, total);
        Some(loaded as f64 * 100.0 / total as f64)
    }

    /// Fields requested from `downloadsV2/queryPackages`.
    #[must_use]
    pub fn query() -> Value {
        json!({
            "name": true,
            "uuid": true,
            "bytesTotal": true,
            "bytesLoaded": true,
            "enabled": true,
            "running": true,
            "finished": true,
            "eta": true,
            "speed": true,
        })
    }
}

/// A link waiting in the LinkGrabber.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkgrabberLink {
    pub uuid: i64,
    pub name: Option<String>,
    #[serde(rename = "packageUUID")]
    pub package_uuid: Option<i64>,
    pub bytes_total: Option<i64>,
    /// e.g. `ONLINE`, `OFFLINE`, `UNKNOWN`.
    pub availability: Option<String>,
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub host: Option<String>,
}

impl LinkgrabberLink {
    /// Fields requested from `linkgrabberv2/queryLinks`.
    #[must_use]
    pub fn query() -> Value {
        json!({
            "name": true,
            "uuid": true,
            "packageUUID": true,
            "bytesTotal": true,
            "availability": true,
            "enabled": true,
            "url": true,
            "host": true,
        })
    }
}

/// Links to submit to the LinkGrabber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLinksRequest {
    /// Newline or whitespace separated links, passed through as-is.
    pub links: String,
    pub package_name: String,
    pub destination_folder: Option<String>,
    pub autostart: bool,
}

impl AddLinksRequest {
    /// Creates a request. Blank package names fall back to
    /// [`DEFAULT_PACKAGE_NAME`] and blank destinations are dropped.
    #[must_use]
    pub fn new(
        links: &str,
        package_name: &str,
        destination_folder: Option<&str>,
        autostart: bool,
    ) -> Self {
        let package_name = match package_name.trim() {
            "" => DEFAULT_PACKAGE_NAME.to_string(),
            name => name.to_string(),
        };
        Self {
            links: links.trim().to_string(),
            package_name,
            destination_folder: destination_folder
                .map(str::trim)
                .filter(|dest| !dest.is_empty())
                .map(str::to_string),
            autostart,
        }
    }

    /// Keeps links in the LinkGrabber for file selection instead of
    /// starting them.
    #[must_use]
    pub fn for_file_selection(mut self, select_files: bool) -> Self {
        if select_files {
            self.autostart = false;
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Query object for `linkgrabberv2/addLinks`.
    #[must_use]
    pub fn query(&self) -> Value {
        let mut query = json!({
            "assignJobID": true,
            "autostart": self.autostart,
            "links": self.links,
            "packageName": self.package_name,
        });
        if let (Some(dest), Some(map)) = (&self.destination_folder, query.as_object_mut()) {
            map.insert("destinationFolder".into(), Value::from(dest.as_str()));
        }
        query
    }
}
