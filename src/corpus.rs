//! Corpus and seed-list loading
//!
//! Phrases come either as plain text, one per line with an optional
//! tab-separated weight:
//!
//! ```text
//! # comments and blank lines are skipped
//! how to cook rice	1200
//! best coffee maker
//! ```
//!
//! or as a JSON array of strings or `{"text": ..., "weight": ...}` objects.
//! Seed and exclusion lists are one entry per line.

use crate::models::Phrase;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid weight '{value}'")]
    InvalidWeight {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type CorpusResult<T> = Result<T, CorpusError>;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPhrase {
    Text(String),
    Record {
        text: String,
        #[serde(default)]
        weight: u64,
    },
}

impl From<JsonPhrase> for Phrase {
    fn from(entry: JsonPhrase) -> Self {
        match entry {
            JsonPhrase::Text(text) => Phrase::new(text, 0),
            JsonPhrase::Record { text, weight } => Phrase::new(text, weight),
        }
    }
}

fn read(path: &Path) -> CorpusResult<String> {
    std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
}

/// Parse line-oriented phrases
pub fn parse_phrase_lines(path: &Path, content: &str) -> CorpusResult<Vec<Phrase>> {
    let mut phrases = Vec::new();
    for (line_no, line) in content_lines(content) {
        let (text, weight) = match line.rsplit_once('\t') {
            Some((text, raw)) => {
                let weight = raw.trim().parse::<u64>().map_err(|_| CorpusError::InvalidWeight {
                    path: path.to_path_buf(),
                    line: line_no,
                    value: raw.trim().to_string(),
                })?;
                (text, weight)
            }
            None => (line, 0),
        };
        let text = text.trim();
        if !text.is_empty() {
            phrases.push(Phrase::new(text, weight));
        }
    }
    Ok(phrases)
}

/// Parse a JSON array of phrases
pub fn parse_phrase_json(path: &Path, content: &str) -> CorpusResult<Vec<Phrase>> {
    let entries: Vec<JsonPhrase> =
        serde_json::from_str(content).map_err(|source| CorpusError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(entries
        .into_iter()
        .map(Phrase::from)
        .filter(|p| !p.text.trim().is_empty())
        .collect())
}

/// Load a corpus file; `.json` files are parsed as JSON, anything else as lines
pub fn load_phrases(path: &Path) -> CorpusResult<Vec<Phrase>> {
    let content = read(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        parse_phrase_json(path, &content)
    } else {
        parse_phrase_lines(path, &content)
    }
}

/// Load a seed or exclusion list, one entry per line
pub fn load_word_list(path: &Path) -> CorpusResult<Vec<String>> {
    let content = read(path)?;
    Ok(content_lines(&content)
        .map(|(_, line)| line.trim().to_string())
        .collect())
}

/// Write one entry per line
pub fn write_word_list(path: &Path, words: &[String]) -> CorpusResult<()> {
    let mut content = words.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}
