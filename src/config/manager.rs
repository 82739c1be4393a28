//! Config lifecycle: resolve the file path, load + reconcile, save atomically.
//!
//! Every caller loads fresh on each use; nothing is cached between calls. Saves
//! go through a temp file in the target's directory that is fsynced and then
//! renamed over the target, so readers see either the old or the new document.

use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::issue::{ConfigIssue, REFUSE_SAVE_MESSAGE};
use super::merge::merge_into;
use super::normalize::normalize;
use super::schema::default_config;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "JD_MOBILE_CONFIG_PATH";

/// Config file location used when nothing else is configured.
pub const DEFAULT_CONFIG_PATH: &str = "/app/config/config.json";

const WRITE_PROBE_FILE: &str = ".write_test";

/// Result of a config load. Built fresh on every load and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigLoadResult {
    /// True when the config is usable and no non-benign issue was found.
    pub ok: bool,
    /// Merged and repaired document.
    pub config: Value,
    /// Diagnostics in discovery order.
    pub errors: Vec<ConfigIssue>,
    /// True when required fields are missing or invalid.
    pub needs_setup: bool,
    /// File the config was loaded from.
    pub path: PathBuf,
}

impl ConfigLoadResult {
    /// Human-readable diagnostics in discovery order.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// The instance referenced by `active_instance_id`, if any.
    #[must_use]
    pub fn active_instance(&self) -> Option<&Value> {
        get_active_instance(&self.config)
    }

    /// Configured UI title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.config["ui"]["title"]
            .as_str()
            .unwrap_or(super::schema::DEFAULT_TITLE)
    }
}

/// Errors returned by [`ConfigManager::save`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// Validation still reports missing or invalid required fields.
    #[error("{}", join_messages(.issues))]
    NeedsSetup {
        /// Validation issues followed by the refusal message.
        issues: Vec<ConfigIssue>,
    },
    /// Filesystem failure while staging or replacing the file.
    #[error("Failed to save config: {}: {source}", .path.display())]
    Io {
        /// Path involved in the failing step.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The document could not be serialized.
    #[error("Failed to save config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SaveError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Messages suitable for showing to the operator.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::NeedsSetup { issues } => issues.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

fn join_messages(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loads, reconciles and persists the config file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a manager using [`resolve_config_path`].
    #[must_use]
    pub fn from_env(explicit: Option<&Path>) -> Self {
        Self::new(resolve_config_path(explicit))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, merges it onto the defaults and validates the result.
    ///
    /// Never fails: unreadable or malformed files degrade to the defaults,
    /// which report `needs_setup`.
    #[must_use]
    pub fn load(&self) -> ConfigLoadResult {
        debug!(path = %self.path.display(), "Loading config");
        let mut errors = Vec::new();
        let mut config = default_config();

        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(user @ Value::Object(_)) => config = merge_into(config, &user),
                Ok(_) => errors.push(ConfigIssue::structural("Config root must be a JSON object.")),
                Err(error) => errors.push(ConfigIssue::structural(format!(
                    "Config JSON parse error: {error}"
                ))),
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                errors.push(ConfigIssue::first_run());
            }
            Err(error) => {
                errors.push(ConfigIssue::structural(format!("Failed to read config: {error}")));
            }
        }

        let report = normalize(&mut config);
        errors.extend(report.issues);
        let ok = !report.needs_setup && errors.iter().all(ConfigIssue::is_benign);

        if !ok {
            debug!(
                needs_setup = report.needs_setup,
                issues = errors.len(),
                "Config requires attention"
            );
        }

        ConfigLoadResult {
            ok,
            config,
            errors,
            needs_setup: report.needs_setup,
            path: self.path.clone(),
        }
    }

    /// Validates a copy of `cfg` and, if usable, writes it atomically.
    ///
    /// Returns the repaired document that was written.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::NeedsSetup`] when the document is still incomplete
    /// after repair, or an IO/serialization error from the write. On error the
    /// previously saved file is untouched.
    pub fn save(&self, cfg: &Value) -> Result<Value, SaveError> {
        let mut candidate = cfg.clone();
        let report = normalize(&mut candidate);
        if report.needs_setup {
            let mut issues = report.issues;
            issues.push(ConfigIssue::completeness(REFUSE_SAVE_MESSAGE));
            warn!(issues = issues.len(), "Refusing to save incomplete config");
            return Err(SaveError::NeedsSetup { issues });
        }

        let bytes = render_config(&candidate)?;
        stage_write(&self.path, &bytes)?.commit()?;
        info!(path = %self.path.display(), "Config saved");
        Ok(candidate)
    }

    /// Checks that the config directory exists (creating it if needed) and
    /// accepts writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        let dir = parent_dir(&self.path);
        let probe = dir.join(WRITE_PROBE_FILE);
        let result = fs::create_dir_all(dir)
            .and_then(|()| fs::write(&probe, b"probe"))
            .and_then(|()| fs::remove_file(&probe));
        if let Err(error) = &result {
            warn!(dir = %dir.display(), error = %error, "Config directory is not writable");
        }
        result.is_ok()
    }
}

/// Looks up the instance whose `id` equals `active_instance_id`.
#[must_use]
pub fn get_active_instance(cfg: &Value) -> Option<&Value> {
    let active_id = cfg.get("active_instance_id")?.as_str()?.trim();
    cfg.get("instances")?
        .as_array()?
        .iter()
        .find(|instance| instance.get("id").and_then(Value::as_str) == Some(active_id))
}

/// Resolves the config file path.
///
/// Priority:
/// 1. `explicit` (e.g. a `--config` flag)
/// 2. `$JD_MOBILE_CONFIG_PATH`
/// 3. `/app/config/config.json`
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_config_path_from(explicit, env::var_os(CONFIG_PATH_ENV))
}

fn resolve_config_path_from(explicit: Option<&Path>, env_value: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(value) = env_value
        && let Some(text) = value.to_str()
        && !text.trim().is_empty()
    {
        return PathBuf::from(text.trim());
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Serializes a config deterministically: sorted keys, two-space indent,
/// trailing newline.
///
/// Keys come out sorted because `serde_json::Map` is a `BTreeMap` without the
/// `preserve_order` feature.
///
/// # Errors
///
/// Returns a serialization error from `serde_json`.
pub fn render_config(cfg: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(cfg)?;
    out.push(b'\n');
    Ok(out)
}

/// Bytes written and flushed to a temp file next to their target, not yet
/// visible at the target path.
///
/// Dropping a `StagedWrite` without committing deletes the temp file.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

/// Writes `bytes` to a temp file in `target`'s directory and forces it to disk.
///
/// # Errors
///
/// Returns [`SaveError::Io`] if the directory cannot be created or the temp
/// file cannot be written or synced.
pub fn stage_write(target: &Path, bytes: &[u8]) -> Result<StagedWrite, SaveError> {
    let dir = parent_dir(target);
    fs::create_dir_all(dir).map_err(|e| SaveError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| SaveError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| SaveError::io(temp.path(), e))?;

    debug!(temp = %temp.path().display(), target = %target.display(), "Staged config write");
    Ok(StagedWrite {
        temp,
        target: target.to_path_buf(),
    })
}

impl StagedWrite {
    /// Path of the staged temp file.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Renames the temp file over the target.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if the rename fails; the temp file is removed.
    pub fn commit(self) -> Result<(), SaveError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| SaveError::io(&target, e.error))?;
        sync_dir(parent_dir(&target));
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

// Persists the rename itself. Not supported everywhere, so failures are only logged.
fn sync_dir(dir: &Path) {
    if let Err(error) = File::open(dir).and_then(|handle| handle.sync_all()) {
        debug!(dir = %dir.display(), error = %error, "Directory sync skipped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::config::issue::{FIRST_RUN_MESSAGE, IssueKind};

    fn manager_in(temp: &TempDir) -> ConfigManager {
        ConfigManager::new(temp.path().join("config.json"))
    }

    fn usable_config() -> Value {
        json!({
            "instances": [{
                "id": "primary",
                "name": "Home",
                "providers": {"primary": {"type": "local", "base_url": "http://192.168.1.5:3128", "timeout_ms": 800}}
            }],
            "active_instance_id": "primary"
        })
    }

    #[test]
    fn test_resolve_config_path_priority() {
        let explicit = Path::new("/tmp/explicit.json");
        assert_eq!(
            resolve_config_path_from(Some(explicit), Some("/env.json".into())),
            PathBuf::from("/tmp/explicit.json")
        );
        assert_eq!(
            resolve_config_path_from(None, Some("  /env.json ".into())),
            PathBuf::from("/env.json")
        );
        assert_eq!(
            resolve_config_path_from(None, Some("   ".into())),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
        assert_eq!(
            resolve_config_path_from(None, None),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }

    #[test]
    fn test_load_missing_file_is_first_run() {
        let temp = TempDir::new().unwrap();
        let result = manager_in(&temp).load();
        assert!(result.needs_setup);
        assert!(!result.ok);
        assert_eq!(result.errors[0].message, FIRST_RUN_MESSAGE);
        assert_eq!(result.config["instances"][0]["id"], "primary");
        assert_eq!(result.config["instances"][0]["providers"]["primary"]["base_url"], "");
    }

    #[test]
    fn test_load_parse_error_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.path(), "{ not json").unwrap();
        let result = manager.load();
        assert!(result.needs_setup);
        assert_eq!(result.errors[0].kind, IssueKind::Structural);
        assert!(result.errors[0].message.starts_with("Config JSON parse error"));
    }

    #[test]
    fn test_load_non_object_root_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.path(), "[1, 2, 3]").unwrap();
        let result = manager.load();
        assert_eq!(result.errors[0].message, "Config root must be a JSON object.");
        assert_eq!(result.config["schema_version"], 1);
    }

    #[test]
    fn test_load_valid_file_is_ok() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.path(), usable_config().to_string()).unwrap();
        let result = manager.load();
        assert!(result.ok, "errors: {:?}", result.errors);
        assert!(!result.needs_setup);
        assert_eq!(result.title(), "JD-Mobile");
    }

    #[test]
    fn test_load_repairable_issue_is_not_ok_but_usable() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        let mut cfg = usable_config();
        cfg["instances"][0]["providers"]["primary"]["timeout_ms"] = json!(5);
        fs::write(manager.path(), cfg.to_string()).unwrap();
        let result = manager.load();
        assert!(!result.needs_setup);
        assert!(!result.ok);
    }

    #[test]
    fn test_save_refuses_incomplete_config() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        let err = manager.save(&default_config()).unwrap_err();
        let messages = err.messages();
        assert_eq!(messages.last().unwrap(), REFUSE_SAVE_MESSAGE);
        assert!(!manager.path().exists());
    }

    #[test]
    fn test_save_writes_sorted_pretty_json() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        manager.save(&usable_config()).unwrap();
        let written = fs::read_to_string(manager.path()).unwrap();
        assert!(written.ends_with("}\n"));
        assert!(written.contains("\n  \"active_instance_id\": \"primary\""));
        let active = written.find("\"active_instance_id\"").unwrap();
        let ui = written.find("\"ui\"").unwrap();
        assert!(active < ui);
    }

    #[test]
    fn test_save_does_not_mutate_input() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        let cfg = usable_config();
        let saved = manager.save(&cfg).unwrap();
        assert_eq!(cfg, usable_config());
        assert_eq!(saved["ui"]["title"], "JD-Mobile");
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(temp.path().join("nested").join("config.json"));
        manager.save(&usable_config()).unwrap();
        assert!(manager.load().ok);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        manager.save(&usable_config()).unwrap();
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_get_active_instance() {
        let mut cfg = usable_config();
        assert_eq!(get_active_instance(&cfg).unwrap()["name"], "Home");
        cfg["active_instance_id"] = json!("ghost");
        assert!(get_active_instance(&cfg).is_none());
    }

    #[test]
    fn test_is_writable_in_temp_dir() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        assert!(manager.is_writable());
        assert!(!temp.path().join(WRITE_PROBE_FILE).exists());
    }
}
