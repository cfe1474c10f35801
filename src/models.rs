//! Core data models for phrasemine
//!
//! These records flow between the discovery stages and are what a run
//! hands back to callers: phrases in, templates and variables out, plus
//! the diagnostics needed to tell "nothing found" from "everything filtered".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Generate a deterministic template ID from its pattern string.
///
/// The ID is a 16-character hex string (xxh3-64), stable across runs and
/// platforms, so downstream storage can upsert templates by ID.
pub fn deterministic_template_id(pattern: &str) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(pattern.as_bytes()))
}

/// A search phrase from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    /// Search volume or any other importance weight (0 when unknown)
    #[serde(default)]
    pub weight: u64,
}

impl Phrase {
    pub fn new(text: impl Into<String>, weight: u64) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

impl From<&str> for Phrase {
    fn from(text: &str) -> Self {
        Self::new(text, 0)
    }
}

/// A contiguous token window and how often it occurs in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NGram {
    pub tokens: Vec<String>,
    pub frequency: u64,
}

impl NGram {
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Where an anchor sits inside the phrases that contain it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPosition {
    Leading,
    Medial,
    Trailing,
}

impl std::fmt::Display for AnchorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorPosition::Leading => write!(f, "leading"),
            AnchorPosition::Medial => write!(f, "medial"),
            AnchorPosition::Trailing => write!(f, "trailing"),
        }
    }
}

/// How a template was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateOrigin {
    /// Inferred from a frequent n-gram anchor
    #[default]
    Anchor,
    /// Built by substituting curated seed words
    Seed,
}

/// A generalized phrase structure with literal text and variable slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePattern {
    pub id: String,
    pub pattern_string: String,
    #[serde(default)]
    pub origin: TemplateOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AnchorPosition>,
    pub match_count: usize,
    /// Up to [`TemplatePattern::MAX_EXAMPLES`] phrases the template was built from
    #[serde(default)]
    pub example_phrases: Vec<String>,
    /// Seed words that produced this pattern (seed origin only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_seeds: Vec<String>,
}

impl TemplatePattern {
    pub const MAX_EXAMPLES: usize = 5;

    /// Template inferred from an anchor
    pub fn from_anchor(
        pattern_string: String,
        anchor: &str,
        position: AnchorPosition,
        match_count: usize,
        example_phrases: Vec<String>,
    ) -> Self {
        Self {
            id: deterministic_template_id(&pattern_string),
            pattern_string,
            origin: TemplateOrigin::Anchor,
            anchor: Some(anchor.to_string()),
            position: Some(position),
            match_count,
            example_phrases: truncate_examples(example_phrases),
            matched_seeds: Vec::new(),
        }
    }

    /// Template built by seed substitution
    pub fn from_seeds(
        pattern_string: String,
        match_count: usize,
        example_phrases: Vec<String>,
        matched_seeds: Vec<String>,
    ) -> Self {
        Self {
            id: deterministic_template_id(&pattern_string),
            pattern_string,
            origin: TemplateOrigin::Seed,
            anchor: None,
            position: None,
            match_count,
            example_phrases: truncate_examples(example_phrases),
            matched_seeds,
        }
    }

    /// Number of well-formed `{NAME}` slot markers
    pub fn slot_count(&self) -> usize {
        crate::discovery::compiler::count_slot_markers(&self.pattern_string)
    }

    /// Tokens split the way the tokenizer splits, a slot marker counting as one
    pub fn token_count(&self) -> usize {
        crate::discovery::compiler::count_pattern_tokens(&self.pattern_string)
    }
}

fn truncate_examples(mut examples: Vec<String>) -> Vec<String> {
    examples.truncate(TemplatePattern::MAX_EXAMPLES);
    examples
}

/// Byte span of one captured slot inside the original phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpan {
    pub start: usize,
    pub end: usize,
    pub slot: String,
}

/// One successful template match against one phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub phrase: String,
    pub weight: u64,
    /// Pattern string of the template that matched
    pub template_ref: String,
    /// Normalized capture per slot; `None` when dropped as noise
    pub slot_values: Vec<Option<String>>,
    /// Phrase text before the first slot
    pub prefix: String,
    /// Phrase text after the last slot
    pub suffix: String,
    /// Phrase text between consecutive slots
    pub middle_literals: Vec<String>,
    pub spans: Vec<SlotSpan>,
}

impl ExtractionRecord {
    /// Raw (un-normalized) text captured by each slot
    pub fn raw_captures(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|s| &self.phrase[s.start..s.end])
    }

    /// Reassemble the phrase from its decomposition
    pub fn reconstruct(&self) -> String {
        let mut out = self.prefix.clone();
        for (i, capture) in self.raw_captures().enumerate() {
            if i > 0 {
                if let Some(middle) = self.middle_literals.get(i - 1) {
                    out.push_str(middle);
                }
            }
            out.push_str(capture);
        }
        out.push_str(&self.suffix);
        out
    }

    /// Captures that survived noise filtering
    pub fn kept_values(&self) -> impl Iterator<Item = &str> {
        self.slot_values.iter().filter_map(|v| v.as_deref())
    }
}

/// A normalized variable value reduced over all extraction records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableAggregate {
    pub variable_text: String,
    pub frequency: u64,
    pub matched_templates: BTreeSet<String>,
    pub total_weight: u64,
}

impl VariableAggregate {
    pub fn new(variable_text: impl Into<String>) -> Self {
        Self {
            variable_text: variable_text.into(),
            frequency: 0,
            matched_templates: BTreeSet::new(),
            total_weight: 0,
        }
    }

    pub fn template_match_count(&self) -> usize {
        self.matched_templates.len()
    }

    /// Corroboration score: frequency × distinct templates
    pub fn cross_validation_score(&self) -> u64 {
        self.frequency * self.matched_templates.len() as u64
    }

    /// Fold another aggregate of the same value into this one
    pub fn absorb(&mut self, other: VariableAggregate) {
        self.frequency += other.frequency;
        self.total_weight = self.total_weight.saturating_add(other.total_weight);
        self.matched_templates.extend(other.matched_templates);
    }
}

/// Output record for a retained variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub variable_text: String,
    pub frequency: u64,
    pub template_match_count: usize,
    pub total_weight: u64,
    pub cross_validation_score: u64,
    pub matched_templates: Vec<String>,
}

impl From<&VariableAggregate> for VariableRecord {
    fn from(agg: &VariableAggregate) -> Self {
        Self {
            variable_text: agg.variable_text.clone(),
            frequency: agg.frequency,
            template_match_count: agg.template_match_count(),
            total_weight: agg.total_weight,
            cross_validation_score: agg.cross_validation_score(),
            matched_templates: agg.matched_templates.iter().cloned().collect(),
        }
    }
}

/// Why a candidate template or variable was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    InsufficientMatches,
    NoSlots,
    DuplicatePattern,
    BelowPercentile,
    TooShort,
    CompileError,
    NoiseCapture,
    BelowFrequency,
    BelowTemplateCount,
    Excluded,
    ReservedCharacter,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DiscardReason::InsufficientMatches => "insufficient matches",
            DiscardReason::NoSlots => "no slots",
            DiscardReason::DuplicatePattern => "duplicate pattern",
            DiscardReason::BelowPercentile => "below percentile",
            DiscardReason::TooShort => "too short",
            DiscardReason::CompileError => "compile error",
            DiscardReason::NoiseCapture => "noise capture",
            DiscardReason::BelowFrequency => "below frequency",
            DiscardReason::BelowTemplateCount => "below template count",
            DiscardReason::Excluded => "excluded",
            DiscardReason::ReservedCharacter => "reserved character",
        };
        write!(f, "{}", label)
    }
}

/// Discard tallies keyed by reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardCounts(pub BTreeMap<DiscardReason, usize>);

impl DiscardCounts {
    pub fn add(&mut self, reason: DiscardReason) {
        self.add_n(reason, 1);
    }

    pub fn add_n(&mut self, reason: DiscardReason, n: usize) {
        if n > 0 {
            *self.0.entry(reason).or_insert(0) += n;
        }
    }

    pub fn get(&self, reason: DiscardReason) -> usize {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn merge(&mut self, other: &DiscardCounts) {
        for (reason, n) in &other.0 {
            self.add_n(*reason, *n);
        }
    }
}

/// Diagnostic summary of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub phrase_count: usize,
    pub empty_corpus: bool,
    /// Unique n-grams kept per window length
    pub ngram_counts_by_length: BTreeMap<usize, usize>,
    /// Most frequent n-grams per window length
    pub top_ngrams: BTreeMap<usize, Vec<NGram>>,
    pub anchor_candidates: usize,
    pub anchors_evaluated: usize,
    pub templates_inferred: usize,
    pub template_threshold: f64,
    pub templates_retained: usize,
    pub template_discards: DiscardCounts,
    pub compile_errors: Vec<String>,
    pub extraction_records: usize,
    pub unique_variables: usize,
    pub variable_frequency: crate::discovery::stats::FrequencyDistribution,
    pub variables_retained: usize,
    pub variable_discards: DiscardCounts,
    /// Retained / unique variables (0.0 when nothing was extracted)
    pub retention_rate: f64,
}

/// Which entry point produced a run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Discover,
    Bootstrap,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Discover => write!(f, "discover"),
            RunMode::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

/// Everything a reporter needs to render a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub generated_at: String,
    pub templates: Vec<TemplatePattern>,
    pub variables: Vec<VariableRecord>,
    pub diagnostics: DiagnosticReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_analysis: Option<crate::discovery::edge_analysis::EdgeAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_seeds: Vec<String>,
}
