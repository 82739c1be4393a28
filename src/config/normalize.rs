//! Field-by-field validation and in-place repair of a merged config document.
//!
//! Every check follows the same policy: on failure, record a diagnostic and
//! coerce the field to a safe value. Nothing here aborts; the caller always
//! gets a repaired document plus the full list of problems, and decides via
//! `needs_setup` whether the config is usable.

use std::collections::HashSet;

use serde_json::{Map, Value};
use url::Url;

use super::issue::ConfigIssue;
use super::merge::merge_into;
use super::schema::{
    DEFAULT_INSTANCE_ID, DEFAULT_TIMEOUT_MS, DEFAULT_TITLE, PROVIDER_LOCAL, PROVIDER_MYJD,
    SCHEMA_VERSION, TIMEOUT_MS_RANGE, default_behavior, default_config, default_fallback_provider,
    default_instance, default_primary_provider, default_providers, default_ui,
    is_valid_instance_id,
};

/// Outcome of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalization {
    /// Diagnostics in discovery order.
    pub issues: Vec<ConfigIssue>,
    /// True when any check left the config inoperable.
    pub needs_setup: bool,
}

impl Normalization {
    fn push(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
    }

    fn require_setup(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
        self.needs_setup = true;
    }
}

/// Validates `cfg` and repairs it in place.
///
/// A non-object root is replaced by the default document.
pub fn normalize(cfg: &mut Value) -> Normalization {
    let mut report = Normalization::default();

    if !cfg.is_object() {
        report.push(ConfigIssue::structural("Config root must be a JSON object."));
        *cfg = default_config();
    }
    let Some(root) = cfg.as_object_mut() else {
        return report;
    };

    normalize_schema_version(root, &mut report);
    normalize_ui(root);
    normalize_behavior(root);
    let seen_ids = normalize_instances(root, &mut report);
    normalize_active_instance(root, &seen_ids, &mut report);
    ensure_enabled_instance(root, &mut report);

    report
}

/// Trims surrounding whitespace and strips trailing slashes.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// True for absolute `http`/`https` URLs with a non-empty host.
#[must_use]
pub fn is_valid_http_url(raw: &str) -> bool {
    let raw = raw.trim();
    Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|h| !h.is_empty())
            // The parser accepts `http:host` and `http:\\host`; require an explicit authority.
            && raw
                .get(url.scheme().len()..)
                .is_some_and(|rest| rest.starts_with("://"))
    })
}

fn normalize_schema_version(root: &mut Map<String, Value>, report: &mut Normalization) {
    match root.get("schema_version") {
        None => {
            root.insert("schema_version".into(), Value::from(SCHEMA_VERSION));
        }
        Some(value) if value.as_u64().is_some_and(|v| v >= 1) => {}
        Some(_) => {
            report.push(ConfigIssue::field("schema_version must be an integer >= 1."));
            root.insert("schema_version".into(), Value::from(SCHEMA_VERSION));
        }
    }
}

fn normalize_ui(root: &mut Map<String, Value>) {
    let mut ui = merged_block(root.remove("ui"), default_ui());
    let has_title = ui
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.is_empty());
    if !has_title && let Some(ui) = ui.as_object_mut() {
        ui.insert("title".into(), Value::from(DEFAULT_TITLE));
    }
    root.insert("ui".into(), ui);
}

fn normalize_behavior(root: &mut Map<String, Value>) {
    let behavior = merged_block(root.remove("behavior"), default_behavior());
    root.insert("behavior".into(), behavior);
}

fn normalize_instances(root: &mut Map<String, Value>, report: &mut Normalization) -> HashSet<String> {
    let usable = root
        .get("instances")
        .and_then(Value::as_array)
        .is_some_and(|instances| !instances.is_empty());
    if !usable {
        report.require_setup(ConfigIssue::completeness("instances must be a non-empty array."));
        root.insert("instances".into(), Value::Array(vec![default_instance()]));
    }

    let mut seen_ids = HashSet::new();
    let Some(instances) = root.get_mut("instances").and_then(Value::as_array_mut) else {
        return seen_ids;
    };

    for (idx, entry) in instances.iter_mut().enumerate() {
        let Some(instance) = entry.as_object_mut() else {
            report.require_setup(ConfigIssue::structural(format!(
                "instances[{idx}] must be an object."
            )));
            continue;
        };
        normalize_instance(idx, instance, &mut seen_ids, report);
    }

    seen_ids
}

fn normalize_instance(
    idx: usize,
    instance: &mut Map<String, Value>,
    seen_ids: &mut HashSet<String>,
    report: &mut Normalization,
) {
    // Only string ids are accepted; `true` or `0` are rewritten like any bad id.
    let mut id = instance
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if !is_valid_instance_id(&id) {
        report.require_setup(ConfigIssue::field(format!(
            "instances[{idx}].id is invalid (lowercase letters/numbers/hyphens, 1-64 chars)."
        )));
        id = format!("instance-{}", idx + 1);
    }
    instance.insert("id".into(), Value::from(id.clone()));

    // Duplicates are flagged, not renamed: active_instance_id may point at either.
    if !seen_ids.insert(id.clone()) {
        report.require_setup(ConfigIssue::referential(format!(
            "Duplicate instance id '{id}'."
        )));
    }

    let has_name = instance
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        instance.insert("name".into(), Value::from(id));
    }

    if !instance.get("enabled").is_some_and(Value::is_boolean) {
        instance.insert("enabled".into(), Value::Bool(true));
    }

    let mut providers = merged_block(instance.remove("providers"), default_providers());
    if let Some(providers) = providers.as_object_mut() {
        normalize_primary(idx, providers, report);
        normalize_fallback(idx, providers, report);
    }
    instance.insert("providers".into(), providers);
}

fn normalize_primary(idx: usize, providers: &mut Map<String, Value>, report: &mut Normalization) {
    if !providers.get("primary").is_some_and(Value::is_object) {
        providers.insert("primary".into(), default_primary_provider());
    }
    let Some(primary) = providers.get_mut("primary").and_then(Value::as_object_mut) else {
        return;
    };

    let mut kind = loose_string(primary.get("type")).to_lowercase();
    if kind != PROVIDER_LOCAL && kind != PROVIDER_MYJD {
        report.push(ConfigIssue::field(format!(
            "instances[{idx}].providers.primary.type must be 'local' or 'myjd'."
        )));
        kind = PROVIDER_LOCAL.to_string();
    }
    let is_local = kind == PROVIDER_LOCAL;
    primary.insert("type".into(), Value::from(kind));

    if !is_local {
        return;
    }

    let base_url = normalize_base_url(
        primary
            .get("base_url")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );
    if base_url.is_empty() {
        report.require_setup(ConfigIssue::completeness(format!(
            "instances[{idx}] primary local base_url is not set."
        )));
    } else if !is_valid_http_url(&base_url) {
        report.require_setup(ConfigIssue::field(format!(
            "instances[{idx}] primary local base_url is not a valid http(s) URL: '{base_url}'"
        )));
    }
    primary.insert("base_url".into(), Value::from(base_url));

    let timeout_ok = primary
        .get("timeout_ms")
        .and_then(Value::as_i64)
        .is_some_and(|ms| TIMEOUT_MS_RANGE.contains(&ms));
    if !timeout_ok {
        report.push(ConfigIssue::field(format!(
            "instances[{idx}].providers.primary.timeout_ms must be 100..60000."
        )));
        primary.insert("timeout_ms".into(), Value::from(DEFAULT_TIMEOUT_MS));
    }
}

fn normalize_fallback(idx: usize, providers: &mut Map<String, Value>, report: &mut Normalization) {
    if !providers.get("fallback").is_some_and(Value::is_object) {
        providers.insert("fallback".into(), default_fallback_provider());
    }
    let Some(fallback) = providers.get_mut("fallback").and_then(Value::as_object_mut) else {
        return;
    };

    let kind = loose_string(fallback.get("type")).to_lowercase();
    if !kind.is_empty() {
        if kind != PROVIDER_MYJD {
            report.push(ConfigIssue::field(format!(
                "instances[{idx}].providers.fallback.type must be 'myjd' when set."
            )));
        }
        fallback.insert("type".into(), Value::from(PROVIDER_MYJD));
    }

    if !fallback.get("enabled").is_some_and(Value::is_boolean) {
        fallback.insert("enabled".into(), Value::Bool(false));
    }
}

fn normalize_active_instance(
    root: &mut Map<String, Value>,
    seen_ids: &HashSet<String>,
    report: &mut Normalization,
) {
    let first_id = root
        .get("instances")
        .and_then(Value::as_array)
        .and_then(|instances| instances.first())
        .and_then(|first| first.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_INSTANCE_ID)
        .to_string();

    let mut active_id = loose_string(root.get("active_instance_id"));
    if active_id.is_empty() {
        active_id.clone_from(&first_id);
    }
    if !seen_ids.contains(&active_id) {
        report.require_setup(ConfigIssue::referential(format!(
            "active_instance_id '{active_id}' does not match any instance."
        )));
        active_id = first_id;
    }
    root.insert("active_instance_id".into(), Value::from(active_id));
}

fn ensure_enabled_instance(root: &mut Map<String, Value>, report: &mut Normalization) {
    let Some(instances) = root.get_mut("instances").and_then(Value::as_array_mut) else {
        return;
    };
    let any_enabled = instances
        .iter()
        .any(|instance| instance.get("enabled") == Some(&Value::Bool(true)));
    if any_enabled {
        return;
    }

    report.require_setup(ConfigIssue::completeness("At least one instance must be enabled."));
    if let Some(first) = instances.first_mut().and_then(Value::as_object_mut) {
        first.insert("enabled".into(), Value::Bool(true));
    }
}

/// Merges a possibly-missing, possibly-mistyped block over its defaults.
fn merged_block(current: Option<Value>, defaults: Value) -> Value {
    let overlay = current
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Map::new()));
    merge_into(defaults, &overlay)
}

/// Reads a value as a trimmed string. Missing, null, `false` and empty values
/// read as empty; other scalars use their JSON text.
fn loose_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}
