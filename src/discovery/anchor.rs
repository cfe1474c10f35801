//! Anchor selection
//!
//! Anchors are the frequent, content-bearing n-grams that template inference
//! starts from. Each anchor costs one pass over the corpus, so the selector
//! caps how many are handed on.

use super::ngram::NgramTable;
use crate::config::{DiscoveryConfig, StopWords};
use crate::models::NGram;
use tracing::debug;

/// Picks anchor candidates from an n-gram table
#[derive(Debug, Clone)]
pub struct AnchorSelector {
    min_tokens: usize,
    max_tokens: usize,
    min_frequency: u64,
    cap: usize,
    stopwords: StopWords,
}

/// Anchors chosen for a run, plus how many qualified before capping
#[derive(Debug, Clone, Default)]
pub struct AnchorSelection {
    pub anchors: Vec<NGram>,
    pub candidates: usize,
}

impl AnchorSelector {
    pub fn new(config: &DiscoveryConfig, stopwords: StopWords) -> Self {
        Self {
            min_tokens: config.anchor_min_tokens,
            max_tokens: config.anchor_max_tokens,
            min_frequency: config.min_template_match_count as u64,
            cap: config.anchor_cap,
            stopwords,
        }
    }

    fn qualifies(&self, ngram: &NGram) -> bool {
        let n = ngram.len();
        n >= self.min_tokens
            && n <= self.max_tokens
            && ngram.frequency >= self.min_frequency
            && !self.stopwords.is_all_stopwords(&ngram.tokens)
    }

    /// Select anchors, sorted by (frequency desc, text asc) and capped
    pub fn select(&self, table: &NgramTable) -> AnchorSelection {
        let mut anchors: Vec<NGram> = table.iter().filter(|g| self.qualifies(g)).cloned().collect();
        anchors.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.tokens.cmp(&b.tokens))
        });

        let candidates = anchors.len();
        anchors.truncate(self.cap);
        debug!(
            "Anchor selection: {} candidates, {} kept (cap {})",
            candidates,
            anchors.len(),
            self.cap
        );

        AnchorSelection {
            anchors,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ngram::NgramAnalyzer;

    fn config(cap: usize) -> DiscoveryConfig {
        DiscoveryConfig {
            anchor_min_tokens: 2,
            anchor_max_tokens: 3,
            min_template_match_count: 2,
            anchor_cap: cap,
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_length_frequency_and_stopwords() {
        let corpus = [
            "how to cook rice",
            "how to cook pasta",
            "how to bake bread",
            "best coffee maker",
        ];
        let table = NgramAnalyzer::new(1, 6).analyze(&corpus);
        let selector = AnchorSelector::new(&config(100), StopWords::default_english());
        let selection = selector.select(&table);

        let texts: Vec<String> = selection.anchors.iter().map(|g| g.text()).collect();
        // "how to" is all stop words; single tokens are too short
        assert_eq!(texts, vec!["how to cook", "to cook"]);
        assert_eq!(selection.candidates, 2);
    }

    #[test]
    fn test_cap_keeps_most_frequent() {
        let corpus = [
            "red apple pie",
            "red apple pie",
            "red apple pie",
            "green pear tart",
            "green pear tart",
        ];
        let table = NgramAnalyzer::new(1, 6).analyze(&corpus);
        let selector = AnchorSelector::new(&config(1), StopWords::empty());
        let selection = selector.select(&table);

        assert_eq!(selection.anchors.len(), 1);
        assert_eq!(selection.anchors[0].text(), "apple pie");
        assert_eq!(selection.anchors[0].frequency, 3);
        assert_eq!(selection.candidates, 6);
    }
}
