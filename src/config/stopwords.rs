//! Stop-word snapshots
//!
//! A snapshot is built once before a run and shared read-only by the
//! analyzer and anchor selector. Editing stop words means building a new
//! snapshot for the next run.

use super::{ConfigError, ConfigResult};
use crate::discovery::ngram::fold_case;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::Arc;

/// Built-in English grammar words (articles, prepositions, pronouns, auxiliaries)
pub const DEFAULT_STOPWORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Prepositions
    "at", "by", "for", "from", "in", "into", "of", "on", "to", "with", "about", "above",
    "across", "after", "against", "along", "among", "around", "before", "behind", "below",
    "beneath", "beside", "between", "beyond", "during", "inside", "near", "outside", "over",
    "through", "under", "until", "up", "upon", "within", "without",
    // Conjunctions
    "and", "but", "or", "nor", "so", "yet",
    // Pronouns
    "i", "me", "my", "we", "our", "you", "your", "he", "him", "his", "she", "her", "it",
    "its", "they", "them", "their",
    // Forms of "be"
    "am", "is", "are", "was", "were", "be", "been", "being",
    // Auxiliaries
    "do", "does", "did", "have", "has", "had",
    // Determiners, question words, modals
    "this", "that", "these", "those", "what", "which", "who", "when", "where", "why", "how",
    "will", "can", "could", "would", "should", "may", "might", "must", "shall",
    // Chinese particles that tend to stick to variable edges
    "的", "了", "在", "和", "与", "或", "上", "下", "中", "是", "有",
];

/// Immutable, cheaply clonable stop-word set
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: Arc<FxHashSet<String>>,
}

impl StopWords {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn default_english() -> Self {
        Self::from_words(DEFAULT_STOPWORDS.iter().copied())
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let set = words
            .into_iter()
            .map(|w| fold_case(w.trim()))
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            words: Arc::new(set),
        }
    }

    /// Load one stop word per line; blank lines and `#` comments are skipped
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    /// New snapshot containing both sets
    pub fn union(&self, other: &StopWords) -> Self {
        let mut set: FxHashSet<String> = (*self.words).clone();
        set.extend(other.words.iter().cloned());
        Self {
            words: Arc::new(set),
        }
    }

    /// New snapshot with additional words
    pub fn with_extra<'a>(&self, extra: impl IntoIterator<Item = &'a str>) -> Self {
        self.union(&Self::from_words(extra))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// True when every token is a stop word (an empty slice counts as all-stop)
    pub fn is_all_stopwords<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        tokens.iter().all(|t| self.contains(t.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Sorted word list, for reports and round-tripping to a file
    pub fn sorted(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list() {
        let words = StopWords::default_english();
        assert!(words.contains("the"));
        assert!(words.contains("how"));
        assert!(!words.contains("coffee"));
    }

    #[test]
    fn test_all_stopwords() {
        let words = StopWords::default_english();
        assert!(words.is_all_stopwords(&["how", "to"]));
        assert!(!words.is_all_stopwords(&["how", "to", "cook"]));
    }

    #[test]
    fn test_snapshots_are_independent() {
        let base = StopWords::default_english();
        let extended = base.with_extra(["Cheap ", ""]);
        assert!(extended.contains("cheap"));
        assert!(!base.contains("cheap"));
        assert_eq!(extended.len(), base.len() + 1);
    }

    #[test]
    fn test_from_file_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "# grammar words\nThe\n\n  for \n").unwrap();
        let words = StopWords::from_file(&path).unwrap();
        assert_eq!(words.sorted(), vec!["for", "the"]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = StopWords::from_file(Path::new("/nonexistent/stop.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
