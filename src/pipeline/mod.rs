//! Discovery pipeline
//!
//! Orchestrates a full run over an in-memory corpus:
//! 1. Count n-grams and select anchors (discover) or substitute seeds (bootstrap)
//! 2. Infer and filter templates
//! 3. Compile templates into matchers
//! 4. Extract variables from every phrase
//! 5. Cross-validate variables
//!
//! Every stage records what it kept and what it dropped in the
//! [`DiagnosticReport`], so an empty result can be told apart from a
//! fully filtered one.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::{ConfigResult, DiscoveryConfig, StopWords};
use crate::discovery::ngram::fold_case;
use crate::discovery::{
    AnchorSelector, CompiledMatcher, CrossValidator, EdgeAnalysis, MatchBoundary, NgramAnalyzer,
    SeedBootstrapper, TemplateFilter, TemplateInferencer, TokenizedCorpus, VariableExtractor,
};
use crate::models::{
    DiagnosticReport, DiscardReason, ExtractionRecord, Phrase, RunMode, RunReport,
    TemplateOrigin, TemplatePattern, VariableRecord,
};

/// N-grams per length listed in diagnostics
pub const DIAGNOSTIC_TOP_NGRAMS: usize = 10;

/// Runs discovery and bootstrap with one validated configuration.
pub struct Pipeline {
    config: DiscoveryConfig,
    stopwords: StopWords,
    excluded_variables: BTreeSet<String>,
}

impl Pipeline {
    /// Create a pipeline; fails if any threshold is invalid.
    pub fn new(config: DiscoveryConfig, stopwords: StopWords) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stopwords,
            excluded_variables: BTreeSet::new(),
        })
    }

    /// Values dropped before aggregation in bootstrap runs.
    pub fn with_excluded_variables<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_variables = values
            .into_iter()
            .map(|v| fold_case(v.as_ref().trim()))
            .filter(|v| !v.is_empty())
            .collect();
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover templates and variables from the corpus alone.
    pub fn discover(&self, phrases: &[Phrase]) -> RunReport {
        let mut diag = DiagnosticReport {
            phrase_count: phrases.len(),
            ..Default::default()
        };

        if phrases.is_empty() {
            warn!("Empty corpus, nothing to discover");
            diag.empty_corpus = true;
            return report(RunMode::Discover, Vec::new(), Vec::new(), diag);
        }

        let texts: Vec<&str> = phrases.iter().map(|p| p.text.as_str()).collect();
        let corpus = TokenizedCorpus::new(&texts);

        let analyzer =
            NgramAnalyzer::new(self.config.min_ngram_frequency, self.config.max_ngram_length);
        let table = analyzer.analyze_tokens(corpus.token_lists());
        diag.ngram_counts_by_length = table.counts_by_length();
        diag.top_ngrams = table.top_by_length(DIAGNOSTIC_TOP_NGRAMS);
        info!("Counted {} n-grams over {} phrases", table.len(), phrases.len());

        let selection = AnchorSelector::new(&self.config, self.stopwords.clone()).select(&table);
        diag.anchor_candidates = selection.candidates;
        info!(
            "Selected {} anchors ({} candidates)",
            selection.anchors.len(),
            selection.candidates
        );

        let inference =
            TemplateInferencer::from_config(&self.config).infer_all(&selection.anchors, &corpus);
        diag.anchors_evaluated = inference.anchors_evaluated;
        diag.templates_inferred = inference.templates.len();
        diag.template_discards.merge(&inference.discards);

        let filtering = TemplateFilter::from_config(&self.config).filter(inference.templates);
        diag.template_threshold = filtering.threshold;
        diag.template_discards.merge(&filtering.discards);
        info!(
            "Inferred {} templates, {} above P{} ({:.1} matches)",
            diag.templates_inferred,
            filtering.retained.len(),
            self.config.template_quality_percentile,
            filtering.threshold
        );

        let (templates, variables, _) =
            self.extract_and_validate(filtering.retained, phrases, &BTreeSet::new(), &mut diag);
        report(RunMode::Discover, templates, variables, diag)
    }

    /// Build templates from seed words, then extract and validate as usual.
    pub fn bootstrap<S: AsRef<str>>(&self, seeds: &[S], phrases: &[Phrase]) -> RunReport {
        let mut diag = DiagnosticReport {
            phrase_count: phrases.len(),
            ..Default::default()
        };

        if phrases.is_empty() {
            warn!("Empty corpus, nothing to bootstrap");
            diag.empty_corpus = true;
            return report(RunMode::Bootstrap, Vec::new(), Vec::new(), diag);
        }

        let seeded = SeedBootstrapper::new(self.config.min_seed_template_frequency)
            .with_boundary(self.config.seed_boundary())
            .build(seeds, phrases);
        diag.templates_inferred = seeded.templates.len();
        diag.template_discards.merge(&seeded.discards);
        info!(
            "Built {} seed templates from {} seeds",
            seeded.templates.len(),
            seeded.seeds.len()
        );

        let (templates, variables, records) = self.extract_and_validate(
            seeded.templates,
            phrases,
            &self.excluded_variables,
            &mut diag,
        );

        let edge = EdgeAnalysis::from_records(
            &records,
            &self.stopwords,
            self.config.edge_noise_min_count,
        );
        if !edge.suggested_stopwords.is_empty() {
            info!(
                "{} stop words suggested from variable edges",
                edge.suggested_stopwords.len()
            );
        }

        let seed_set: BTreeSet<&str> = seeded.seeds.iter().map(String::as_str).collect();
        let next_seeds = variables
            .iter()
            .map(|v| v.variable_text.clone())
            .filter(|v| !seed_set.contains(v.as_str()))
            .collect();

        let mut run = report(RunMode::Bootstrap, templates, variables, diag);
        run.edge_analysis = Some(edge);
        run.next_seeds = next_seeds;
        run
    }

    fn extract_and_validate(
        &self,
        templates: Vec<TemplatePattern>,
        phrases: &[Phrase],
        excluded: &BTreeSet<String>,
        diag: &mut DiagnosticReport,
    ) -> (Vec<TemplatePattern>, Vec<VariableRecord>, Vec<ExtractionRecord>) {
        let (templates, matchers) =
            compile_templates(templates, self.config.seed_boundary(), diag);
        diag.templates_retained = templates.len();

        let records = VariableExtractor::new(self.config.min_variable_length)
            .extract_all(&matchers, phrases);
        diag.extraction_records = records.len();
        info!(
            "Extracted {} records with {} templates",
            records.len(),
            matchers.len()
        );

        let validation = CrossValidator::from_config(&self.config).validate(&records, excluded);
        diag.unique_variables = validation.unique_variables;
        diag.variables_retained = validation.retained.len();
        diag.retention_rate = validation.retention_rate();
        diag.variable_frequency = validation.distribution.clone();
        diag.variable_discards.merge(&validation.discards);
        info!(
            "Retained {} of {} variables",
            validation.retained.len(),
            validation.unique_variables
        );

        let variables = validation.retained.iter().map(VariableRecord::from).collect();
        (templates, variables, records)
    }
}

/// Compile every template, dropping the ones that fail.
///
/// Discovered templates match on token edges; seed templates use `seed_boundary`.
fn compile_templates(
    templates: Vec<TemplatePattern>,
    seed_boundary: MatchBoundary,
    diag: &mut DiagnosticReport,
) -> (Vec<TemplatePattern>, Vec<CompiledMatcher>) {
    let mut kept = Vec::with_capacity(templates.len());
    let mut matchers = Vec::with_capacity(templates.len());

    for template in templates {
        let boundary = match template.origin {
            TemplateOrigin::Anchor => MatchBoundary::TokenEdges,
            TemplateOrigin::Seed => seed_boundary,
        };
        match CompiledMatcher::compile_with(&template.pattern_string, boundary) {
            Ok(matcher) => {
                debug!("Compiled '{}' ({} slots)", template.pattern_string, matcher.slot_count());
                matchers.push(matcher);
                kept.push(template);
            }
            Err(e) => {
                warn!("Skipping template: {}", e);
                diag.template_discards.add(DiscardReason::CompileError);
                diag.compile_errors.push(e.to_string());
            }
        }
    }

    (kept, matchers)
}

fn report(
    mode: RunMode,
    templates: Vec<TemplatePattern>,
    variables: Vec<VariableRecord>,
    diagnostics: DiagnosticReport,
) -> RunReport {
    RunReport {
        mode,
        generated_at: chrono::Utc::now().to_rfc3339(),
        templates,
        variables,
        diagnostics,
        edge_analysis: None,
        next_seeds: Vec::new(),
    }
}
