//! JD-Mobile Core Library
//!
//! Configuration reconciliation and downloader access for a mobile-friendly
//! control surface over a local JDownloader instance.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Default schema, deep merge, validation/repair, atomic persistence
//! - [`provider`] - Backend contract and the local HTTP API adapter
//! - [`health`] - `/help` liveness probe and health report
//! - [`setup`] - Manual setup of the primary instance

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod health;
pub mod provider;
pub mod setup;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoadResult, ConfigManager, IssueKind, SaveError};
pub use health::{HealthReport, ProbeOutcome, health_report, probe_help};
pub use provider::{
    AddLinksRequest, DownloadPackage, LinkgrabberLink, LocalProvider, Provider, ProviderError,
    ProviderKind, ProviderSettings, active_provider, build_provider, start_selection,
};
pub use setup::{ManualSetup, SetupError, apply_manual_setup, run_manual_setup};
