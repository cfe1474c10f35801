//! Template discovery and variable extraction
//!
//! Stages, in the order a discovery run uses them:
//!
//! 1. [`ngram`]: count token windows over the corpus
//! 2. [`anchor`]: keep frequent, content-bearing n-grams as anchors
//! 3. [`inference`]: generalize each anchor into a pattern
//! 4. [`validation::TemplateFilter`]: drop weak templates
//! 5. [`compiler`]: compile patterns into slot matchers
//! 6. [`extractor`]: capture slot values from every phrase
//! 7. [`validation::CrossValidator`]: keep values several templates agree on
//!
//! [`bootstrap`] replaces steps 1-4 with seed substitution, and
//! [`edge_analysis`] reports on extracted values without changing them.

pub mod anchor;
pub mod bootstrap;
pub mod compiler;
pub mod edge_analysis;
pub mod extractor;
pub mod inference;
pub mod ngram;
pub mod stats;
pub mod validation;

pub use anchor::{AnchorSelection, AnchorSelector};
pub use bootstrap::{SeedBootstrapper, SeedTemplates};
pub use compiler::{CompileError, CompiledMatcher, MatchBoundary, SlotMatch};
pub use edge_analysis::EdgeAnalysis;
pub use extractor::VariableExtractor;
pub use inference::{InferenceRun, TemplateInferencer};
pub use ngram::{tokenize, NgramAnalyzer, NgramTable};
pub use validation::{CrossValidator, TemplateFilter, TemplateFiltering, VariableValidation};

use rayon::prelude::*;

/// Phrase texts with their token lists, tokenized once per run
#[derive(Debug, Clone, Default)]
pub struct TokenizedCorpus<'a> {
    texts: Vec<&'a str>,
    tokens: Vec<Vec<String>>,
}

impl<'a> TokenizedCorpus<'a> {
    pub fn new<S: AsRef<str> + Sync>(texts: &'a [S]) -> Self {
        let texts: Vec<&'a str> = texts.iter().map(AsRef::as_ref).collect();
        let tokens = texts.par_iter().map(|t| tokenize(t)).collect();
        Self { texts, tokens }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Original text of phrase `idx`
    pub fn text(&self, idx: usize) -> &'a str {
        self.texts[idx]
    }

    pub fn token_lists(&self) -> &[Vec<String>] {
        &self.tokens
    }
}
