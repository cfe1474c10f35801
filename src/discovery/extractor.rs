//! Variable extraction
//!
//! Runs compiled matchers over the corpus and records, per matching phrase,
//! the normalized slot values and a decomposition of the original text:
//! `prefix + slot_1 + middle_1 + ... + slot_n + suffix == phrase`.

use super::compiler::CompiledMatcher;
use super::ngram::fold_case;
use crate::models::{ExtractionRecord, Phrase, SlotSpan};
use rayon::prelude::*;

/// Trim and lower-case a raw capture
pub fn normalize_capture(raw: &str) -> String {
    fold_case(raw.trim())
}

/// Extracts slot values from phrases
#[derive(Debug, Clone, Copy)]
pub struct VariableExtractor {
    min_variable_length: usize,
}

impl VariableExtractor {
    pub fn new(min_variable_length: usize) -> Self {
        Self {
            min_variable_length,
        }
    }

    /// Match one phrase against one template
    pub fn extract(&self, matcher: &CompiledMatcher, phrase: &Phrase) -> Option<ExtractionRecord> {
        let found = matcher.find(&phrase.text)?;
        let text = phrase.text.as_str();
        let (first_start, last_end) = match (found.spans.first(), found.spans.last()) {
            (Some(first), Some(last)) => (first.0, last.1),
            _ => return None,
        };

        let slot_values = found
            .spans
            .iter()
            .map(|&(s, e)| {
                let value = normalize_capture(&text[s..e]);
                (value.chars().count() >= self.min_variable_length).then_some(value)
            })
            .collect();

        let middle_literals = found
            .spans
            .windows(2)
            .map(|pair| text[pair[0].1..pair[1].0].to_string())
            .collect();

        let spans = found
            .spans
            .iter()
            .zip(matcher.slot_names())
            .map(|(&(start, end), name)| SlotSpan {
                start,
                end,
                slot: name.clone(),
            })
            .collect();

        Some(ExtractionRecord {
            phrase: phrase.text.clone(),
            weight: phrase.weight,
            template_ref: matcher.pattern().to_string(),
            slot_values,
            prefix: text[..first_start].to_string(),
            suffix: text[last_end..].to_string(),
            middle_literals,
            spans,
        })
    }

    /// Run every matcher over every phrase.
    ///
    /// Records come out in corpus order, and within a phrase in matcher order.
    pub fn extract_all(
        &self,
        matchers: &[CompiledMatcher],
        phrases: &[Phrase],
    ) -> Vec<ExtractionRecord> {
        phrases
            .par_iter()
            .flat_map_iter(|phrase| {
                matchers
                    .iter()
                    .filter_map(move |m| self.extract(m, phrase))
            })
            .collect()
    }
}
