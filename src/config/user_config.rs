//! User-level configuration for phrasemine
//!
//! Supports loading from:
//! - `PHRASEMINE_STOPWORDS` (path to a stop-word file)
//! - ~/.config/phrasemine/stopwords.txt

use std::path::PathBuf;

/// Locations of per-user files that apply to every project
#[derive(Debug, Default)]
pub struct UserConfig;

impl UserConfig {
    /// Get the user config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("phrasemine"))
    }

    /// User stop-word file, with the environment variable taking priority
    pub fn stopwords_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PHRASEMINE_STOPWORDS") {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::config_dir().map(|p| p.join("stopwords.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_name() {
        if let Some(p) = UserConfig::config_dir() {
            assert!(p.ends_with("phrasemine"));
        }
    }

    #[test]
    fn test_stopwords_path_returns_some() {
        // On most systems, config_dir() should return a valid path
        if std::env::var("PHRASEMINE_STOPWORDS").is_err() {
            if let Some(p) = UserConfig::stopwords_path() {
                assert!(p.ends_with("phrasemine/stopwords.txt"));
            }
        }
    }
}
