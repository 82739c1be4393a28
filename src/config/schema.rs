//! Default configuration document and field constants.
//!
//! The default document is the merge target for every load, so any partial or
//! legacy config still yields a structurally complete result.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

/// Current schema version written by this release.
pub const SCHEMA_VERSION: i64 = 1;

/// Title used when `ui.title` is missing or empty.
pub const DEFAULT_TITLE: &str = "JD-Mobile";

/// Id of the seed instance in the default document.
pub const DEFAULT_INSTANCE_ID: &str = "primary";

/// Primary provider timeout applied when the configured value is unusable.
pub const DEFAULT_TIMEOUT_MS: i64 = 800;

/// Inclusive bounds for `providers.primary.timeout_ms`.
pub const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<i64> = 100..=60_000;

/// Primary provider kind backed by the local HTTP API.
pub const PROVIDER_LOCAL: &str = "local";

/// Remote provider kind (MyJDownloader). Recognized, not operable.
pub const PROVIDER_MYJD: &str = "myjd";

#[allow(clippy::expect_used)]
static INSTANCE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").expect("instance id regex is valid") // Static pattern, safe to panic
});

/// Returns true when `id` is a valid instance id.
///
/// Ids are lowercase letters, digits and hyphens, 1-64 chars, not starting
/// with a hyphen.
#[must_use]
pub fn is_valid_instance_id(id: &str) -> bool {
    INSTANCE_ID_PATTERN.is_match(id)
}

/// Builds a fresh copy of the default configuration document.
///
/// Every call returns an independent value; callers are free to mutate it.
#[must_use]
pub fn default_config() -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "ui": default_ui(),
        "instances": [default_instance()],
        "active_instance_id": DEFAULT_INSTANCE_ID,
        "behavior": default_behavior(),
    })
}

/// Default `ui` block.
#[must_use]
pub fn default_ui() -> Value {
    json!({
        "title": DEFAULT_TITLE,
        "default_view": "packages",
    })
}

/// Default `behavior` block.
#[must_use]
pub fn default_behavior() -> Value {
    json!({
        "prefer_primary": true,
        "failover_on_unreachable": false,
    })
}

/// Default seed instance. Its `base_url` is empty until setup runs.
#[must_use]
pub fn default_instance() -> Value {
    json!({
        "id": DEFAULT_INSTANCE_ID,
        "name": "Primary",
        "enabled": true,
        "providers": default_providers(),
    })
}

/// Default `providers` block of an instance.
#[must_use]
pub fn default_providers() -> Value {
    json!({
        "primary": default_primary_provider(),
        "fallback": default_fallback_provider(),
    })
}

/// Default primary provider block.
#[must_use]
pub fn default_primary_provider() -> Value {
    json!({
        "type": PROVIDER_LOCAL,
        "base_url": "",
        "timeout_ms": DEFAULT_TIMEOUT_MS,
    })
}

/// Default fallback provider block. Credential fields are reserved.
#[must_use]
pub fn default_fallback_provider() -> Value {
    json!({
        "type": PROVIDER_MYJD,
        "enabled": false,
        "email": "",
        "password": "",
        "device_name": "",
    })
}
