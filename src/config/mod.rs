//! Configuration module for phrasemine
//!
//! This module handles:
//! - Discovery thresholds (`[discovery]` in phrasemine.toml)
//! - Stop-word snapshots (built-in list, project file, user file)
//! - CLI defaults
//!
//! Configuration problems are the only fatal errors in a run.

mod project_config;
mod stopwords;
mod user_config;

pub use project_config::{
    load_config_file, load_project_config, CliDefaults, DiscoveryConfig, ProjectConfig,
    StopwordConfig, CONFIG_FILENAME, JSON_CONFIG_FILENAME, MAX_NGRAM_WINDOW,
};
pub use stopwords::{StopWords, DEFAULT_STOPWORDS};
pub use user_config::UserConfig;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
