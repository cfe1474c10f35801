//! Template inference from anchors
//!
//! An anchor plus the phrases that contain it is generalized into a pattern
//! by looking at where the anchor usually sits and whether the text around
//! it is constant. For example, with the anchor `best laptop for`:
//!
//! ```text
//! best laptop for gaming      ─┐
//! best laptop for students     ├─▶  best laptop for {SLOT}
//! best laptop for video editing ┘
//! ```
//!
//! Inference only looks at a fixed-size sample of matches; `match_count`
//! still counts every matching phrase.

use super::TokenizedCorpus;
use crate::config::DiscoveryConfig;
use crate::models::{AnchorPosition, DiscardCounts, DiscardReason, NGram, TemplatePattern};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Index of the leftmost occurrence of `needle` as a contiguous token run
pub fn find_token_run(tokens: &[String], needle: &[String]) -> Option<usize> {
    if needle.is_empty() || needle.len() > tokens.len() {
        return None;
    }
    tokens.windows(needle.len()).position(|w| w == needle)
}

/// Where the anchor was found in one sampled phrase
#[derive(Debug, Clone)]
struct Occurrence<'a> {
    start: usize,
    prefix: &'a [String],
    suffix: &'a [String],
}

/// Templates inferred over a set of anchors
#[derive(Debug, Clone, Default)]
pub struct InferenceRun {
    pub templates: Vec<TemplatePattern>,
    pub anchors_evaluated: usize,
    pub discards: DiscardCounts,
}

/// Generalizes anchors into template patterns
#[derive(Debug, Clone, Copy)]
pub struct TemplateInferencer {
    min_matches: usize,
    sample_size: usize,
}

impl TemplateInferencer {
    pub fn new(min_matches: usize, sample_size: usize) -> Self {
        Self {
            min_matches,
            sample_size: sample_size.max(1),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.min_template_match_count, config.inference_sample_size)
    }

    /// Infer a template for one anchor, or say why none was produced
    pub fn infer(
        &self,
        anchor: &[String],
        corpus: &TokenizedCorpus<'_>,
    ) -> Result<TemplatePattern, DiscardReason> {
        let mut matches: Vec<(usize, usize)> = Vec::new();
        for (idx, tokens) in corpus.token_lists().iter().enumerate() {
            if let Some(start) = find_token_run(tokens, anchor) {
                matches.push((idx, start));
            }
        }

        let anchor_text = anchor.join(" ");
        if matches.is_empty() || matches.len() < self.min_matches {
            debug!(
                "Anchor '{}': {} matches, need {}",
                anchor_text,
                matches.len(),
                self.min_matches
            );
            return Err(DiscardReason::InsufficientMatches);
        }

        let samples: Vec<Occurrence<'_>> = matches
            .iter()
            .take(self.sample_size)
            .map(|&(idx, start)| {
                let tokens = &corpus.token_lists()[idx];
                Occurrence {
                    start,
                    prefix: &tokens[..start],
                    suffix: &tokens[start + anchor.len()..],
                }
            })
            .collect();

        let (position, pattern) = build_pattern(&anchor_text, &samples);
        let examples: Vec<String> = matches
            .iter()
            .take(TemplatePattern::MAX_EXAMPLES)
            .map(|&(idx, _)| corpus.text(idx).to_string())
            .collect();

        let template =
            TemplatePattern::from_anchor(pattern, &anchor_text, position, matches.len(), examples);
        if template.slot_count() == 0 {
            debug!(
                "Anchor '{}': pattern '{}' has no slots",
                anchor_text, template.pattern_string
            );
            return Err(DiscardReason::NoSlots);
        }

        debug!(
            "Anchor '{}' ({}) -> '{}' ({} matches)",
            anchor_text, position, template.pattern_string, template.match_count
        );
        Ok(template)
    }

    /// Infer templates for every anchor and merge duplicate patterns.
    ///
    /// When two anchors produce the same pattern the one with more matches
    /// is kept (ties: lexicographically smaller anchor), so the result does
    /// not depend on anchor order.
    pub fn infer_all(&self, anchors: &[NGram], corpus: &TokenizedCorpus<'_>) -> InferenceRun {
        let results: Vec<Result<TemplatePattern, DiscardReason>> = anchors
            .par_iter()
            .map(|anchor| self.infer(&anchor.tokens, corpus))
            .collect();

        let mut discards = DiscardCounts::default();
        let mut by_pattern: BTreeMap<String, TemplatePattern> = BTreeMap::new();

        for result in results {
            let template = match result {
                Ok(t) => t,
                Err(reason) => {
                    discards.add(reason);
                    continue;
                }
            };

            match by_pattern.get_mut(&template.pattern_string) {
                Some(existing) => {
                    discards.add(DiscardReason::DuplicatePattern);
                    if outranks(&template, existing) {
                        *existing = template;
                    }
                }
                None => {
                    by_pattern.insert(template.pattern_string.clone(), template);
                }
            }
        }

        InferenceRun {
            templates: by_pattern.into_values().collect(),
            anchors_evaluated: anchors.len(),
            discards,
        }
    }
}

fn outranks(candidate: &TemplatePattern, existing: &TemplatePattern) -> bool {
    candidate.match_count > existing.match_count
        || (candidate.match_count == existing.match_count && candidate.anchor < existing.anchor)
}

/// Most common start index; ties resolve to the smallest index
fn modal_start(samples: &[Occurrence<'_>]) -> usize {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for s in samples {
        *counts.entry(s.start).or_insert(0) += 1;
    }
    let mut best = (0, 0);
    for (start, count) in counts {
        if count > best.1 {
            best = (start, count);
        }
    }
    best.0
}

/// The shared token run if every sample has the same one
fn common_run<'a>(runs: impl Iterator<Item = &'a [String]>) -> Option<&'a [String]> {
    let mut first: Option<&[String]> = None;
    for run in runs {
        match first {
            None => first = Some(run),
            Some(f) if f != run => return None,
            Some(_) => {}
        }
    }
    first
}

fn build_pattern(anchor: &str, samples: &[Occurrence<'_>]) -> (AnchorPosition, String) {
    let start = modal_start(samples);
    let all_suffixes_empty = samples.iter().all(|s| s.suffix.is_empty());

    let position = if start == 0 {
        AnchorPosition::Leading
    } else if all_suffixes_empty {
        AnchorPosition::Trailing
    } else {
        AnchorPosition::Medial
    };

    let fixed_prefix = common_run(samples.iter().map(|s| s.prefix)).filter(|p| !p.is_empty());
    let fixed_suffix = common_run(samples.iter().map(|s| s.suffix));

    let mut slots = SlotNames::default();
    let mut parts: Vec<String> = Vec::new();

    match position {
        AnchorPosition::Leading => {
            parts.push(anchor.to_string());
            match fixed_suffix {
                Some(suffix) if !suffix.is_empty() => parts.push(suffix.join(" ")),
                Some(_) => {}
                None => parts.push(slots.next_marker()),
            }
        }
        AnchorPosition::Medial | AnchorPosition::Trailing => {
            match fixed_prefix {
                Some(prefix) => parts.push(prefix.join(" ")),
                None => parts.push(slots.next_marker()),
            }
            parts.push(anchor.to_string());
            if !all_suffixes_empty {
                match fixed_suffix {
                    Some(suffix) => parts.push(suffix.join(" ")),
                    None => parts.push(slots.next_marker()),
                }
            }
        }
    }

    (position, parts.join(" "))
}

/// Hands out `{SLOT}`, `{SLOT2}`, `{SLOT3}` in order
#[derive(Default)]
struct SlotNames {
    issued: usize,
}

impl SlotNames {
    fn next_marker(&mut self) -> String {
        self.issued += 1;
        if self.issued == 1 {
            "{SLOT}".to_string()
        } else {
            format!("{{SLOT{}}}", self.issued)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ngram::tokenize;

    fn anchor(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn test_leading_anchor() {
        let texts = ["best coffee maker", "best coffee machine", "best espresso maker"];
        let corpus = TokenizedCorpus::new(&texts);
        let inferencer = TemplateInferencer::new(1, 20);

        let t = inferencer.infer(&anchor("best coffee"), &corpus).unwrap();
        assert_eq!(t.pattern_string, "best coffee {SLOT}");
        assert_eq!(t.match_count, 2);
        assert_eq!(t.position, Some(AnchorPosition::Leading));
        assert_eq!(t.anchor.as_deref(), Some("best coffee"));
        assert_eq!(t.example_phrases, vec!["best coffee maker", "best coffee machine"]);
    }

    #[test]
    fn test_medial_with_fixed_prefix() {
        let texts = [
            "the best laptop for gaming",
            "the best laptop for students",
            "the best laptop for video editing",
        ];
        let corpus = TokenizedCorpus::new(&texts);
        let t = TemplateInferencer::new(3, 20)
            .infer(&anchor("best laptop for"), &corpus)
            .unwrap();
        assert_eq!(t.pattern_string, "the best laptop for {SLOT}");
        assert_eq!(t.position, Some(AnchorPosition::Medial));
    }

    #[test]
    fn test_medial_without_fixed_prefix() {
        let texts = ["cheap flights to paris now", "last minute flights to rome today"];
        let corpus = TokenizedCorpus::new(&texts);
        let t = TemplateInferencer::new(2, 20)
            .infer(&anchor("flights to"), &corpus)
            .unwrap();
        // modal start tie (1 vs 2) resolves to the smaller index
        assert_eq!(t.pattern_string, "{SLOT} flights to {SLOT2}");
        assert_eq!(t.slot_count(), 2);
    }

    #[test]
    fn test_medial_fixed_suffix_stays_literal() {
        let texts = ["paris hotel deals online", "rome hotel deals online"];
        let corpus = TokenizedCorpus::new(&texts);
        let t = TemplateInferencer::new(2, 20)
            .infer(&anchor("hotel deals"), &corpus)
            .unwrap();
        assert_eq!(t.pattern_string, "{SLOT} hotel deals online");
    }

    #[test]
    fn test_trailing_anchor() {
        let texts = ["chocolate cake recipe", "banana bread recipe", "pasta recipe"];
        let corpus = TokenizedCorpus::new(&texts);
        let t = TemplateInferencer::new(3, 20)
            .infer(&anchor("recipe"), &corpus)
            .unwrap();
        assert_eq!(t.pattern_string, "{SLOT} recipe");
        assert_eq!(t.position, Some(AnchorPosition::Trailing));
    }

    #[test]
    fn test_insufficient_matches() {
        let texts = ["best coffee maker"];
        let corpus = TokenizedCorpus::new(&texts);
        let err = TemplateInferencer::new(2, 20)
            .infer(&anchor("best coffee"), &corpus)
            .unwrap_err();
        assert_eq!(err, DiscardReason::InsufficientMatches);
    }

    #[test]
    fn test_fully_fixed_is_rejected() {
        let texts = ["best coffee maker", "best coffee maker"];
        let corpus = TokenizedCorpus::new(&texts);
        let err = TemplateInferencer::new(1, 20)
            .infer(&anchor("best coffee"), &corpus)
            .unwrap_err();
        assert_eq!(err, DiscardReason::NoSlots);
    }

    #[test]
    fn test_leftmost_occurrence_used() {
        let texts = ["to be or to be", "to be happy"];
        let corpus = TokenizedCorpus::new(&texts);
        let t = TemplateInferencer::new(2, 20)
            .infer(&anchor("to be"), &corpus)
            .unwrap();
        assert_eq!(t.position, Some(AnchorPosition::Leading));
        assert_eq!(t.pattern_string, "to be {SLOT}");
    }

    #[test]
    fn test_duplicate_patterns_merged() {
        let texts = [
            "red apple pie x",
            "red apple pie y",
            "red apple pie z",
        ];
        let corpus = TokenizedCorpus::new(&texts);
        let anchors = vec![
            NGram { tokens: anchor("red apple pie"), frequency: 3 },
            NGram { tokens: anchor("red apple"), frequency: 3 },
        ];
        let run = TemplateInferencer::new(1, 20).infer_all(&anchors, &corpus);
        // "red apple {SLOT}" and "red apple pie {SLOT}" are distinct
        assert_eq!(run.templates.len(), 2);
        assert_eq!(run.anchors_evaluated, 2);

        let reversed: Vec<NGram> = anchors.iter().rev().cloned().collect();
        let run2 = TemplateInferencer::new(1, 20).infer_all(&reversed, &corpus);
        assert_eq!(run.templates, run2.templates);
    }

    #[test]
    fn test_same_pattern_from_two_anchors() {
        let texts = ["a b c d", "x b c d"];
        let corpus = TokenizedCorpus::new(&texts);
        let anchors = vec![
            NGram { tokens: anchor("b c d"), frequency: 2 },
            NGram { tokens: anchor("b c d"), frequency: 2 },
        ];
        let run = TemplateInferencer::new(1, 20).infer_all(&anchors, &corpus);
        assert_eq!(run.templates.len(), 1);
        assert_eq!(run.discards.get(DiscardReason::DuplicatePattern), 1);
        assert_eq!(run.templates[0].pattern_string, "{SLOT} b c d");
    }
}
