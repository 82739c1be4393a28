//! Manual setup: point the primary instance at a reachable downloader.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;

use crate::config::normalize::normalize_base_url;
use crate::config::schema::{DEFAULT_INSTANCE_ID, PROVIDER_LOCAL, PROVIDER_MYJD, default_config};
use crate::config::{ConfigManager, SaveError};
use crate::health::probe_help;

/// Instance name used when none is given.
pub const DEFAULT_INSTANCE_NAME: &str = "Primary";

/// Errors returned by [`run_manual_setup`].
#[derive(Debug, Error)]
pub enum SetupError {
    /// The `/help` probe did not succeed; nothing was saved.
    #[error("Connection test failed: {0}")]
    ConnectionFailed(String),
    /// The updated config could not be saved.
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Operator input for manual setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSetup {
    pub base_url: String,
    pub timeout_ms: u64,
    pub name: String,
}

impl ManualSetup {
    /// Normalizes the base URL and falls back to [`DEFAULT_INSTANCE_NAME`]
    /// for a blank name.
    #[must_use]
    pub fn new(base_url: &str, timeout_ms: u64, name: &str) -> Self {
        let name = match name.trim() {
            "" => DEFAULT_INSTANCE_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            base_url: normalize_base_url(base_url),
            timeout_ms,
            name,
        }
    }
}

/// Writes `setup` into `cfg`.
///
/// With no instances, a fresh `primary` instance is inserted and made
/// active. Otherwise the first instance is updated in place (other keys are
/// kept) and made active.
pub fn apply_manual_setup(cfg: &mut Value, setup: &ManualSetup) {
    if !cfg.is_object() {
        *cfg = default_config();
    }
    let Some(root) = cfg.as_object_mut() else {
        return;
    };

    let instances = root
        .entry("instances")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !instances.is_array() {
        *instances = Value::Array(Vec::new());
    }
    let Some(list) = instances.as_array_mut() else {
        return;
    };

    let active_id = if let Some(first) = list.first_mut() {
        update_instance(first, setup)
    } else {
        list.push(new_instance(setup));
        DEFAULT_INSTANCE_ID.to_string()
    };
    root.insert("active_instance_id".into(), Value::String(active_id));
}

fn new_instance(setup: &ManualSetup) -> Value {
    json!({
        "id": DEFAULT_INSTANCE_ID,
        "name": setup.name,
        "enabled": true,
        "providers": {
            "primary": {
                "type": PROVIDER_LOCAL,
                "base_url": setup.base_url,
                "timeout_ms": setup.timeout_ms,
            },
            "fallback": {"type": PROVIDER_MYJD, "enabled": false},
        },
    })
}

// Returns the id to activate.
fn update_instance(instance: &mut Value, setup: &ManualSetup) -> String {
    if !instance.is_object() {
        *instance = Value::Object(Map::new());
    }
    let Some(map) = instance.as_object_mut() else {
        return DEFAULT_INSTANCE_ID.to_string();
    };
    map.insert("name".into(), Value::from(setup.name.as_str()));

    if let Some(primary) = object_entry(map, "providers").and_then(|p| object_entry(p, "primary")) {
        primary.insert("type".into(), Value::from(PROVIDER_LOCAL));
        primary.insert("base_url".into(), Value::from(setup.base_url.as_str()));
        primary.insert("timeout_ms".into(), Value::from(setup.timeout_ms));
    }

    map.get("id")
        .and_then(Value::as_str)
        .map_or_else(|| DEFAULT_INSTANCE_ID.to_string(), str::to_string)
}

// Child object at `key`, replacing any non-object value.
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let slot = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
}

/// Probes the downloader, then applies and saves the setup.
///
/// Returns the saved document.
///
/// # Errors
///
/// Returns [`SetupError::ConnectionFailed`] when the probe fails, or
/// [`SetupError::Save`] when the resulting config cannot be saved.
pub async fn run_manual_setup(
    manager: &ConfigManager,
    setup: &ManualSetup,
) -> Result<Value, SetupError> {
    let probe = probe_help(&setup.base_url, setup.timeout_ms).await;
    if !probe.ok {
        return Err(SetupError::ConnectionFailed(probe.message));
    }

    let mut cfg = manager.load().config;
    apply_manual_setup(&mut cfg, setup);
    let saved = manager.save(&cfg)?;
    info!(base_url = %setup.base_url, name = %setup.name, "Manual setup saved");
    Ok(saved)
}
