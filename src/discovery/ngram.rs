//! N-gram frequency analysis
//!
//! Counts every contiguous token window (length 1 up to the configured
//! maximum) across the corpus. Duplicate phrases count fully: a phrase that
//! appears five times contributes five occurrences of each of its windows.
//!
//! Counting runs on rayon with per-worker [`NgramCounts`] tables merged by
//! reduction, so no counter is shared between threads.

use crate::config::MAX_NGRAM_WINDOW;
use crate::models::NGram;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Characters that separate tokens
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-'
}

/// Lower-case one character, keeping it one character wide.
///
/// `char::to_lowercase` can expand (`İ` becomes `i` + U+0307); only the
/// first character is kept so folded text lines up with the original
/// character by character.
pub fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Case-fold a string with [`fold_char`]. Every stage that compares text
/// (tokens, literals, seeds, captures) folds through here.
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Lower-case a phrase and split it on whitespace and hyphens.
pub fn tokenize(text: &str) -> Vec<String> {
    fold_case(text)
        .split(is_separator)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of tokens in `text`, using the tokenizer's separators
pub fn count_tokens(text: &str) -> usize {
    text.split(is_separator).filter(|t| !t.is_empty()).count()
}

/// Window counts accumulated by one worker
#[derive(Debug, Default)]
pub struct NgramCounts {
    counts: FxHashMap<String, u64>,
}

impl NgramCounts {
    /// Count every window of length 1..=max_window in one token sequence
    pub fn add_tokens(&mut self, tokens: &[String], max_window: usize) {
        for n in 1..=max_window.min(tokens.len()) {
            for window in tokens.windows(n) {
                *self.counts.entry(window.join(" ")).or_insert(0) += 1;
            }
        }
    }

    /// Merge two worker tables, folding the smaller into the larger
    pub fn merge(mut self, mut other: NgramCounts) -> NgramCounts {
        if self.counts.len() < other.counts.len() {
            std::mem::swap(&mut self, &mut other);
        }
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Frequency-filtered n-grams, sorted by (frequency desc, text asc)
#[derive(Debug, Clone, Default)]
pub struct NgramTable {
    ngrams: Vec<NGram>,
}

impl NgramTable {
    fn from_counts(counts: NgramCounts, min_frequency: u64) -> Self {
        let mut ngrams: Vec<NGram> = counts
            .counts
            .into_iter()
            .filter(|(_, freq)| *freq >= min_frequency)
            .map(|(key, frequency)| NGram {
                tokens: key.split(' ').map(str::to_string).collect(),
                frequency,
            })
            .collect();

        ngrams.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.tokens.cmp(&b.tokens))
        });

        Self { ngrams }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NGram> {
        self.ngrams.iter()
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    /// Frequency of a space-joined n-gram, if it survived filtering
    pub fn frequency(&self, text: &str) -> Option<u64> {
        self.ngrams
            .iter()
            .find(|g| g.text() == text)
            .map(|g| g.frequency)
    }

    /// Number of kept n-grams per window length
    pub fn counts_by_length(&self) -> BTreeMap<usize, usize> {
        let mut out = BTreeMap::new();
        for g in &self.ngrams {
            *out.entry(g.len()).or_insert(0) += 1;
        }
        out
    }

    /// The `k` most frequent n-grams of each length
    pub fn top_by_length(&self, k: usize) -> BTreeMap<usize, Vec<NGram>> {
        let mut out: BTreeMap<usize, Vec<NGram>> = BTreeMap::new();
        for g in &self.ngrams {
            let bucket = out.entry(g.len()).or_default();
            if bucket.len() < k {
                bucket.push(g.clone());
            }
        }
        out
    }

    /// Keep only n-grams of exactly `n` tokens
    pub fn retain_length(mut self, n: usize) -> Self {
        self.ngrams.retain(|g| g.len() == n);
        self
    }
}

/// Counts token windows over a corpus
#[derive(Debug, Clone, Copy)]
pub struct NgramAnalyzer {
    min_frequency: u64,
    max_window: usize,
}

impl NgramAnalyzer {
    /// `max_window` is clamped to 1..=6
    pub fn new(min_frequency: u64, max_window: usize) -> Self {
        Self {
            min_frequency,
            max_window: max_window.clamp(1, MAX_NGRAM_WINDOW),
        }
    }

    /// Analyze raw phrase texts
    pub fn analyze<S: AsRef<str> + Sync>(&self, texts: &[S]) -> NgramTable {
        let tokenized: Vec<Vec<String>> = texts.par_iter().map(|t| tokenize(t.as_ref())).collect();
        self.analyze_tokens(&tokenized)
    }

    /// Analyze a corpus that was already tokenized with [`tokenize`]
    pub fn analyze_tokens(&self, tokenized: &[Vec<String>]) -> NgramTable {
        let max_window = self.max_window;
        let counts = tokenized
            .par_iter()
            .fold(NgramCounts::default, |mut acc, tokens| {
                acc.add_tokens(tokens, max_window);
                acc
            })
            .reduce(NgramCounts::default, NgramCounts::merge);

        NgramTable::from_counts(counts, self.min_frequency)
    }
}
