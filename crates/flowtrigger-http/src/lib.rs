//! HTTP adapter for the jobs backend.
//!
//! This crate owns transport and workspace configuration only. Validation,
//! result shaping and polling policy stay in `flowtrigger-core`.

pub mod client;
pub mod config;

pub use client::{GET_RUN_PATH, HttpBackendError, HttpJobsBackend, RUN_NOW_PATH};
pub use config::{
    ConfigError, ConfigFile, ConfigOverrides, DEFAULT_TIMEOUT, HOST_ENV, TOKEN_ENV,
    WorkspaceConfig,
};
