//! Configuration document: defaults, merge, validation and persistence.
//!
//! The document is kept as a [`serde_json::Value`] so keys this crate does not
//! know about survive a load/save cycle.

pub mod issue;
pub mod manager;
pub mod merge;
pub mod normalize;
pub mod schema;

pub use issue::{ConfigIssue, IssueKind};
pub use manager::{
    CONFIG_PATH_ENV, ConfigLoadResult, ConfigManager, DEFAULT_CONFIG_PATH, SaveError,
    get_active_instance, resolve_config_path,
};
pub use merge::merge;
pub use normalize::{Normalization, normalize, normalize_base_url};
pub use schema::default_config;
