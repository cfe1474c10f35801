//! Variable edge analysis
//!
//! Advisory statistics over extracted values: which characters and tokens
//! most often start or end a variable. A grammar word that keeps showing up
//! at a variable edge usually means a template is one token too short, so
//! those are suggested as stop words for the curator to review. Nothing
//! here feeds back into a run.

use super::ngram::is_separator;
use crate::config::StopWords;
use crate::models::ExtractionRecord;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entries kept per frequency table
pub const EDGE_TOP_N: usize = 50;
/// Variables listed per template
pub const VARIABLES_PER_TEMPLATE: usize = 20;

/// One row of a frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeAnalysis {
    pub first_chars: Vec<EdgeCount>,
    pub last_chars: Vec<EdgeCount>,
    pub first_tokens: Vec<EdgeCount>,
    pub last_tokens: Vec<EdgeCount>,
    /// Template pattern -> first distinct variables it extracted
    pub template_variables: BTreeMap<String, Vec<String>>,
    /// Frequent edge tokens (or, in unsegmented text, edge characters) that are stop words
    pub suggested_stopwords: Vec<EdgeCount>,
}

#[derive(Default)]
struct Tally(FxHashMap<String, u64>);

impl Tally {
    fn bump(&mut self, key: impl Into<String>) {
        *self.0.entry(key.into()).or_insert(0) += 1;
    }

    /// Rows sorted by count desc, value asc
    fn ranked(&self) -> Vec<EdgeCount> {
        let mut rows: Vec<EdgeCount> = self
            .0
            .iter()
            .map(|(value, &count)| EdgeCount {
                value: value.clone(),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        rows
    }

    fn top(&self, n: usize) -> Vec<EdgeCount> {
        let mut rows = self.ranked();
        rows.truncate(n);
        rows
    }
}

/// Letters from scripts without case (Han, kana, Hangul), which are usually
/// written without spaces between words
fn is_caseless_letter(c: char) -> bool {
    c.is_alphabetic() && !c.is_lowercase() && !c.is_uppercase()
}

/// The stop word sitting at one edge of a value: the edge token itself, or
/// for unsegmented text the edge character
fn edge_stopword(stopwords: &StopWords, token: &str, ch: char) -> Option<String> {
    if stopwords.contains(token) {
        return Some(token.to_string());
    }
    let word = ch.to_string();
    (is_caseless_letter(ch) && stopwords.contains(&word)).then_some(word)
}

impl EdgeAnalysis {
    /// Analyze kept values across all records (every occurrence counts)
    pub fn from_records(
        records: &[ExtractionRecord],
        stopwords: &StopWords,
        noise_min_count: u64,
    ) -> Self {
        let mut first_chars = Tally::default();
        let mut last_chars = Tally::default();
        let mut first_tokens = Tally::default();
        let mut last_tokens = Tally::default();
        let mut template_variables: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut edge_stopwords = Tally::default();

        for record in records {
            for value in record.kept_values() {
                let (Some(first_char), Some(last_char)) =
                    (value.chars().next(), value.chars().next_back())
                else {
                    continue;
                };
                first_chars.bump(first_char.to_string());
                last_chars.bump(last_char.to_string());

                let mut tokens = value.split(is_separator).filter(|t| !t.is_empty());
                if let Some(first) = tokens.next() {
                    let last = tokens.next_back().unwrap_or(first);
                    first_tokens.bump(first);
                    last_tokens.bump(last);
                    for (token, ch) in [(first, first_char), (last, last_char)] {
                        if let Some(word) = edge_stopword(stopwords, token, ch) {
                            edge_stopwords.bump(word);
                        }
                    }
                }

                let listed = template_variables
                    .entry(record.template_ref.clone())
                    .or_default();
                if listed.len() < VARIABLES_PER_TEMPLATE && !listed.iter().any(|v| v == value) {
                    listed.push(value.to_string());
                }
            }
        }

        let suggested_stopwords = edge_stopwords
            .ranked()
            .into_iter()
            .filter(|row| row.count >= noise_min_count)
            .collect();

        Self {
            first_chars: first_chars.top(EDGE_TOP_N),
            last_chars: last_chars.top(EDGE_TOP_N),
            first_tokens: first_tokens.top(EDGE_TOP_N),
            last_tokens: last_tokens.top(EDGE_TOP_N),
            template_variables,
            suggested_stopwords,
        }
    }
}
