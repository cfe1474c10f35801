//! Project-level configuration support
//!
//! Loads per-project configuration from `phrasemine.toml` or
//! `.phrasemine.json` in the working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # phrasemine.toml
//!
//! [discovery]
//! min_ngram_frequency = 5
//! anchor_cap = 100
//! min_template_match_count = 10
//! template_quality_percentile = 75
//! min_variable_frequency = 3
//! min_variable_template_count = 2
//!
//! [stopwords]
//! file = "stopwords_en.txt"
//! extra = ["near", "me"]
//!
//! [defaults]
//! format = "text"
//! workers = 8
//! ```

use super::{ConfigError, ConfigResult, StopWords, UserConfig};
use crate::discovery::MatchBoundary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILENAME: &str = "phrasemine.toml";
pub const JSON_CONFIG_FILENAME: &str = ".phrasemine.json";

/// Longest n-gram window the analyzer supports
pub const MAX_NGRAM_WINDOW: usize = 6;

/// Thresholds and limits for a discovery or bootstrap run.
///
/// Immutable once a run starts; validate with [`DiscoveryConfig::validate`]
/// before handing it to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Minimum corpus frequency for an n-gram to be kept
    pub min_ngram_frequency: u64,
    /// Longest n-gram window (1-6)
    pub max_ngram_length: usize,
    /// Shortest anchor, in tokens
    pub anchor_min_tokens: usize,
    /// Longest anchor, in tokens
    pub anchor_max_tokens: usize,
    /// Maximum anchors evaluated per run (each costs one corpus scan)
    pub anchor_cap: usize,
    /// Matching phrases inspected when inferring a pattern
    pub inference_sample_size: usize,
    /// Minimum phrases an anchor (and its template) must match
    pub min_template_match_count: usize,
    /// Templates below this match-count percentile are dropped
    pub template_quality_percentile: f64,
    /// Minimum extraction count for a retained variable
    pub min_variable_frequency: u64,
    /// Minimum distinct templates for a retained variable
    pub min_variable_template_count: usize,
    /// Captures shorter than this (in chars, after trimming) are noise
    pub min_variable_length: usize,
    /// Minimum phrase count for a seed-substitution pattern
    pub min_seed_template_frequency: usize,
    /// Only accept seeds, and match seed templates, on token edges.
    /// Off by default so unsegmented text (Chinese, Japanese) works.
    pub seed_token_edges: bool,
    /// Edge-token count at which a stop word is suggested for review
    pub edge_noise_min_count: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_ngram_frequency: 5,
            max_ngram_length: MAX_NGRAM_WINDOW,
            anchor_min_tokens: 3,
            anchor_max_tokens: 4,
            anchor_cap: 100,
            inference_sample_size: 20,
            min_template_match_count: 10,
            template_quality_percentile: 75.0,
            min_variable_frequency: 3,
            min_variable_template_count: 2,
            min_variable_length: 2,
            min_seed_template_frequency: 3,
            seed_token_edges: false,
            edge_noise_min_count: 50,
        }
    }
}

impl DiscoveryConfig {
    /// Check every threshold. Any violation aborts the run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_ngram_frequency == 0 {
            return Err(ConfigError::invalid("min_ngram_frequency", "must be at least 1"));
        }
        if self.max_ngram_length == 0 || self.max_ngram_length > MAX_NGRAM_WINDOW {
            return Err(ConfigError::invalid(
                "max_ngram_length",
                format!("must be between 1 and {}", MAX_NGRAM_WINDOW),
            ));
        }
        if self.anchor_min_tokens == 0 {
            return Err(ConfigError::invalid("anchor_min_tokens", "must be at least 1"));
        }
        if self.anchor_min_tokens > self.anchor_max_tokens {
            return Err(ConfigError::invalid(
                "anchor_min_tokens",
                format!(
                    "{} exceeds anchor_max_tokens ({})",
                    self.anchor_min_tokens, self.anchor_max_tokens
                ),
            ));
        }
        if self.anchor_max_tokens > self.max_ngram_length {
            return Err(ConfigError::invalid(
                "anchor_max_tokens",
                format!(
                    "{} exceeds max_ngram_length ({})",
                    self.anchor_max_tokens, self.max_ngram_length
                ),
            ));
        }
        if self.anchor_cap == 0 {
            return Err(ConfigError::invalid("anchor_cap", "must be at least 1"));
        }
        if self.inference_sample_size == 0 {
            return Err(ConfigError::invalid("inference_sample_size", "must be at least 1"));
        }
        if self.min_template_match_count == 0 {
            return Err(ConfigError::invalid("min_template_match_count", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.template_quality_percentile) {
            return Err(ConfigError::invalid(
                "template_quality_percentile",
                format!("{} is outside 0-100", self.template_quality_percentile),
            ));
        }
        if self.min_variable_frequency == 0 {
            return Err(ConfigError::invalid("min_variable_frequency", "must be at least 1"));
        }
        if self.min_variable_template_count == 0 {
            return Err(ConfigError::invalid(
                "min_variable_template_count",
                "must be at least 1",
            ));
        }
        if self.min_variable_length == 0 {
            return Err(ConfigError::invalid("min_variable_length", "must be at least 1"));
        }
        if self.min_seed_template_frequency == 0 {
            return Err(ConfigError::invalid(
                "min_seed_template_frequency",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Boundary rule for seed-origin templates
    pub fn seed_boundary(&self) -> MatchBoundary {
        if self.seed_token_edges {
            MatchBoundary::TokenEdges
        } else {
            MatchBoundary::Anywhere
        }
    }
}

/// Stop-word sources layered on top of the built-in list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopwordConfig {
    /// One stop word per line; relative paths resolve against the config dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Additional stop words
    #[serde(default)]
    pub extra: Vec<String>,

    /// Start from an empty list instead of the built-in one
    #[serde(default)]
    pub replace_defaults: bool,
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliDefaults {
    /// Default output format (text, json, markdown)
    #[serde(default)]
    pub format: Option<String>,

    /// Default number of workers
    #[serde(default)]
    pub workers: Option<usize>,

    /// Default number of templates/variables shown by text reports
    #[serde(default)]
    pub top: Option<usize>,
}

/// Project-level configuration loaded from phrasemine.toml or similar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub stopwords: StopwordConfig,

    #[serde(default)]
    pub defaults: CliDefaults,

    /// Directory the config was loaded from (not serialized)
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Build the immutable stop-word snapshot for a run.
    ///
    /// Layers, in order: built-in list (unless replaced), the user-level
    /// file, the project file, then `extra`.
    pub fn stopword_snapshot(&self) -> ConfigResult<StopWords> {
        let mut words = if self.stopwords.replace_defaults {
            StopWords::empty()
        } else {
            StopWords::default_english()
        };

        if let Some(user_file) = UserConfig::stopwords_path().filter(|p| p.exists()) {
            debug!("Loading user stop words from {}", user_file.display());
            words = words.union(&StopWords::from_file(&user_file)?);
        }

        if let Some(file) = &self.stopwords.file {
            let path = match &self.base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            words = words.union(&StopWords::from_file(&path)?);
        }

        Ok(words.with_extra(self.stopwords.extra.iter().map(String::as_str)))
    }

    fn with_base_dir(mut self, dir: &Path) -> Self {
        self.base_dir = Some(dir.to_path_buf());
        self
    }
}

/// Load project configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `phrasemine.toml`
/// 2. `.phrasemine.json`
///
/// Returns default configuration if no config file is found. A file that
/// exists but cannot be read or parsed is an error, as is any invalid
/// threshold.
pub fn load_project_config(dir: &Path) -> ConfigResult<ProjectConfig> {
    for name in [CONFIG_FILENAME, JSON_CONFIG_FILENAME] {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            debug!("Loaded project config from {}", path.display());
            return Ok(config);
        }
    }

    debug!("No project config found, using defaults");
    Ok(ProjectConfig::default().with_base_dir(dir))
}

/// Load a specific config file, choosing the parser by extension
pub fn load_config_file(path: &Path) -> ConfigResult<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config: ProjectConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    config.discovery.validate()?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.with_base_dir(base))
}
