//! Seed-driven template bootstrapping
//!
//! The alternative entry point to anchor discovery: given curated seed
//! words, every phrase containing a seed becomes a pattern by replacing the
//! seed with one slot marker.
//!
//! ```text
//! seeds:   android
//! phrases: best android app   ->  best {SLOT} app
//!          android vs ios     ->  {SLOT} vs ios
//! ```
//!
//! Patterns seen often enough become templates that go through the same
//! compile, extract and validate stages as discovered templates.
//!
//! Seeds are found as plain substrings by default, so keyword corpora written
//! without spaces (`闲鱼上卖手机` with seed `手机`) bootstrap the same way as
//! English ones. [`SeedBootstrapper::with_boundary`] restricts seeds to token
//! edges instead.

use super::compiler::{count_pattern_tokens, MatchBoundary};
use super::ngram::{fold_case, is_separator};
use super::validation::MIN_TEMPLATE_TOKENS;
use crate::models::{DiscardCounts, DiscardReason, Phrase, TemplatePattern};
use memchr::memmem;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// The marker a seed is replaced with
pub const SEED_SLOT: &str = "{SLOT}";

/// Trim, case-fold and de-duplicate seeds, keeping first-seen order
pub fn normalize_seeds<S: AsRef<str>>(seeds: &[S]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    seeds
        .iter()
        .map(|s| fold_case(s.as_ref().trim()))
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Phrase text that would be read back as slot syntax
pub fn has_reserved_chars(text: &str) -> bool {
    memchr::memchr2(b'{', b'}', text.as_bytes()).is_some()
}

/// Byte offset of the leftmost occurrence of `seed` allowed by `boundary`
pub fn find_seed(haystack: &str, seed: &str, boundary: MatchBoundary) -> Option<usize> {
    if seed.is_empty() {
        return None;
    }
    let mut hits = memmem::find_iter(haystack.as_bytes(), seed.as_bytes());
    match boundary {
        MatchBoundary::Anywhere => hits.next(),
        MatchBoundary::TokenEdges => hits.find(|&start| {
            let end = start + seed.len();
            let before_ok = haystack[..start]
                .chars()
                .next_back()
                .map_or(true, is_separator);
            let after_ok = haystack[end..].chars().next().map_or(true, is_separator);
            before_ok && after_ok
        }),
    }
}

/// Replace the leftmost seed occurrence with a slot marker.
///
/// Returns `None` when the seed is absent or the phrase contains braces.
/// Whitespace in the result is collapsed to single spaces.
pub fn substitute_seed(phrase: &str, seed: &str, boundary: MatchBoundary) -> Option<String> {
    if has_reserved_chars(phrase) {
        return None;
    }
    let folded = fold_case(phrase);
    let start = find_seed(&folded, seed, boundary)?;
    let replaced = format!(
        "{}{}{}",
        &folded[..start],
        SEED_SLOT,
        &folded[start + seed.len()..]
    );
    Some(replaced.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[derive(Debug, Default)]
struct PatternTally {
    count: usize,
    seeds: BTreeSet<String>,
    examples: Vec<String>,
}

#[derive(Debug, Default)]
struct TallyTable {
    patterns: BTreeMap<String, PatternTally>,
    /// Phrases holding a seed that were skipped for containing braces
    reserved: usize,
}

impl TallyTable {
    fn merge(mut self, other: TallyTable) -> TallyTable {
        for (pattern, tally) in other.patterns {
            let entry = self.patterns.entry(pattern).or_default();
            entry.count += tally.count;
            entry.seeds.extend(tally.seeds);
            let room = TemplatePattern::MAX_EXAMPLES.saturating_sub(entry.examples.len());
            entry.examples.extend(tally.examples.into_iter().take(room));
        }
        self.reserved += other.reserved;
        self
    }
}

/// Seed templates plus what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct SeedTemplates {
    /// By match count desc, then pattern asc
    pub templates: Vec<TemplatePattern>,
    /// Normalized seeds that were searched for
    pub seeds: Vec<String>,
    pub discards: DiscardCounts,
}

/// Builds templates from seed words
#[derive(Debug, Clone, Copy)]
pub struct SeedBootstrapper {
    min_template_frequency: usize,
    boundary: MatchBoundary,
}

impl SeedBootstrapper {
    /// Seeds are matched as substrings
    pub fn new(min_template_frequency: usize) -> Self {
        Self {
            min_template_frequency,
            boundary: MatchBoundary::Anywhere,
        }
    }

    pub fn with_boundary(mut self, boundary: MatchBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn build<S: AsRef<str>>(&self, seeds: &[S], phrases: &[Phrase]) -> SeedTemplates {
        let seeds = normalize_seeds(seeds);
        let boundary = self.boundary;

        let table = phrases
            .par_iter()
            .fold(TallyTable::default, |mut acc, phrase| {
                if has_reserved_chars(&phrase.text) {
                    let folded = fold_case(&phrase.text);
                    if seeds.iter().any(|seed| find_seed(&folded, seed, boundary).is_some()) {
                        acc.reserved += 1;
                    }
                    return acc;
                }
                for seed in &seeds {
                    if let Some(pattern) = substitute_seed(&phrase.text, seed, boundary) {
                        let tally = acc.patterns.entry(pattern).or_default();
                        tally.count += 1;
                        tally.seeds.insert(seed.clone());
                        if tally.examples.len() < TemplatePattern::MAX_EXAMPLES {
                            tally.examples.push(phrase.text.clone());
                        }
                    }
                }
                acc
            })
            .reduce(TallyTable::default, TallyTable::merge);

        let mut discards = DiscardCounts::default();
        discards.add_n(DiscardReason::ReservedCharacter, table.reserved);

        let mut templates = Vec::new();
        for (pattern, tally) in table.patterns {
            if count_pattern_tokens(&pattern) < MIN_TEMPLATE_TOKENS {
                discards.add(DiscardReason::TooShort);
            } else if tally.count < self.min_template_frequency {
                discards.add(DiscardReason::InsufficientMatches);
            } else {
                debug!("Seed pattern '{}' ({} phrases)", pattern, tally.count);
                templates.push(TemplatePattern::from_seeds(
                    pattern,
                    tally.count,
                    tally.examples,
                    tally.seeds.into_iter().collect(),
                ));
            }
        }

        templates.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.pattern_string.cmp(&b.pattern_string))
        });

        SeedTemplates {
            templates,
            seeds,
            discards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(texts: &[&str]) -> Vec<Phrase> {
        texts.iter().map(|t| Phrase::from(*t)).collect()
    }

    #[test]
    fn test_seed_substitution() {
        let result = SeedBootstrapper::new(1).build(
            &["android"],
            &phrases(&["best android app", "android vs ios"]),
        );
        let summary: Vec<(&str, usize)> = result
            .templates
            .iter()
            .map(|t| (t.pattern_string.as_str(), t.match_count))
            .collect();
        assert_eq!(summary, vec![("best {SLOT} app", 1), ("{SLOT} vs ios", 1)]);
        assert_eq!(result.templates[0].matched_seeds, vec!["android".to_string()]);
    }

    #[test]
    fn test_seed_found_as_substring() {
        assert_eq!(find_seed("androids are cool", "android", MatchBoundary::Anywhere), Some(0));
        assert_eq!(find_seed("androids are cool", "android", MatchBoundary::TokenEdges), None);
        assert_eq!(
            find_seed("my android-phone", "android", MatchBoundary::TokenEdges),
            Some(3)
        );
        assert_eq!(
            substitute_seed("Android  VS  android", "android", MatchBoundary::Anywhere).as_deref(),
            Some("{SLOT} vs android")
        );
    }

    #[test]
    fn test_unsegmented_corpus() {
        let result = SeedBootstrapper::new(1).build(
            &["手机"],
            &phrases(&["闲鱼上卖手机", "闲鱼上卖电脑", "闲鱼上卖相机", "手机怎么卖"]),
        );
        let patterns: Vec<&str> = result.templates.iter().map(|t| t.pattern_string.as_str()).collect();
        assert_eq!(patterns, vec!["{SLOT}怎么卖", "闲鱼上卖{SLOT}"]);

        let edges = SeedBootstrapper::new(1)
            .with_boundary(MatchBoundary::TokenEdges)
            .build(&["手机"], &phrases(&["闲鱼上卖手机", "手机怎么卖"]));
        assert!(edges.templates.is_empty());
    }

    #[test]
    fn test_braces_in_phrase_rejected() {
        assert_eq!(
            substitute_seed("best android {x} app", "android", MatchBoundary::Anywhere),
            None
        );
        let result = SeedBootstrapper::new(1).build(
            &["android"],
            &phrases(&["best android {x} app", "best android app", "{ios} app"]),
        );
        let patterns: Vec<&str> = result.templates.iter().map(|t| t.pattern_string.as_str()).collect();
        assert_eq!(patterns, vec!["best {SLOT} app"]);
        assert_eq!(result.discards.get(DiscardReason::ReservedCharacter), 1);
    }

    #[test]
    fn test_hyphenated_pattern_counts_two_tokens() {
        let result = SeedBootstrapper::new(1).build(&["android"], &phrases(&["android-phone"]));
        let patterns: Vec<&str> = result.templates.iter().map(|t| t.pattern_string.as_str()).collect();
        assert_eq!(patterns, vec!["{SLOT}-phone"]);
        assert_eq!(result.discards.get(DiscardReason::TooShort), 0);
    }

    #[test]
    fn test_dotted_capital_i_seed() {
        assert_eq!(
            substitute_seed("İstanbul hotel deals", "istanbul", MatchBoundary::Anywhere).as_deref(),
            Some("{SLOT} hotel deals")
        );
    }

    #[test]
    fn test_seeds_normalized() {
        assert_eq!(
            normalize_seeds(&[" Android", "android", "", "iPhone "]),
            vec!["android".to_string(), "iphone".to_string()]
        );
    }

    #[test]
    fn test_frequency_and_length_thresholds() {
        let result = SeedBootstrapper::new(2).build(
            &["tea", "coffee"],
            &phrases(&["buy tea online", "buy coffee online", "tea", "green tea"]),
        );
        let patterns: Vec<&str> = result.templates.iter().map(|t| t.pattern_string.as_str()).collect();
        assert_eq!(patterns, vec!["buy {SLOT} online"]);
        assert_eq!(result.templates[0].match_count, 2);
        assert_eq!(
            result.templates[0].matched_seeds,
            vec!["coffee".to_string(), "tea".to_string()]
        );
        assert_eq!(result.discards.get(DiscardReason::TooShort), 1);
        assert_eq!(result.discards.get(DiscardReason::InsufficientMatches), 1);
    }
}
