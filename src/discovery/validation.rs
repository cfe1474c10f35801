//! Cross-validation and filtering
//!
//! A value extracted by one template may be an accident of that template;
//! a value that several independent templates agree on is much more likely
//! to be a real variable. Variables are scored by
//! `frequency × distinct templates` and kept only when both counts clear
//! their thresholds. Templates are filtered by a match-count percentile.

use super::stats::{percentile, FrequencyDistribution};
use crate::config::DiscoveryConfig;
use crate::models::{DiscardCounts, DiscardReason, ExtractionRecord, TemplatePattern, VariableAggregate};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Reduce extraction records to one aggregate per normalized value.
///
/// Noise captures (`None`) are skipped. Output is sorted by value text.
pub fn aggregate_records(records: &[ExtractionRecord]) -> Vec<VariableAggregate> {
    let table = records
        .par_iter()
        .fold(FxHashMap::<String, VariableAggregate>::default, |mut acc, record| {
            for value in record.kept_values() {
                let agg = acc
                    .entry(value.to_string())
                    .or_insert_with(|| VariableAggregate::new(value));
                agg.frequency += 1;
                agg.total_weight = agg.total_weight.saturating_add(record.weight);
                agg.matched_templates.insert(record.template_ref.clone());
            }
            acc
        })
        .reduce(FxHashMap::default, |mut left, right| {
            for (key, agg) in right {
                match left.get_mut(&key) {
                    Some(existing) => existing.absorb(agg),
                    None => {
                        left.insert(key, agg);
                    }
                }
            }
            left
        });

    let mut aggregates: Vec<VariableAggregate> = table.into_values().collect();
    aggregates.sort_by(|a, b| a.variable_text.cmp(&b.variable_text));
    aggregates
}

/// Outcome of variable cross-validation
#[derive(Debug, Clone, Default)]
pub struct VariableValidation {
    /// Retained variables, best first
    pub retained: Vec<VariableAggregate>,
    /// Distinct values seen before thresholds (exclusions not counted)
    pub unique_variables: usize,
    pub distribution: FrequencyDistribution,
    pub discards: DiscardCounts,
}

impl VariableValidation {
    /// Retained / unique, or 0.0 when nothing was extracted
    pub fn retention_rate(&self) -> f64 {
        if self.unique_variables == 0 {
            0.0
        } else {
            self.retained.len() as f64 / self.unique_variables as f64
        }
    }
}

/// Thresholds a variable must clear
#[derive(Debug, Clone, Copy)]
pub struct CrossValidator {
    min_frequency: u64,
    min_template_count: usize,
}

impl CrossValidator {
    pub fn new(min_frequency: u64, min_template_count: usize) -> Self {
        Self {
            min_frequency,
            min_template_count,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.min_variable_frequency, config.min_variable_template_count)
    }

    /// Aggregate, score, and filter extracted variables.
    ///
    /// Values in `excluded` are dropped before aggregation.
    pub fn validate(
        &self,
        records: &[ExtractionRecord],
        excluded: &BTreeSet<String>,
    ) -> VariableValidation {
        let mut discards = DiscardCounts::default();
        let noise = records
            .iter()
            .map(|r| r.slot_values.iter().filter(|v| v.is_none()).count())
            .sum();
        discards.add_n(DiscardReason::NoiseCapture, noise);

        let mut aggregates = aggregate_records(records);
        let before = aggregates.len();
        aggregates.retain(|a| !excluded.contains(&a.variable_text));
        discards.add_n(DiscardReason::Excluded, before - aggregates.len());

        let unique_variables = aggregates.len();
        let mut frequencies: Vec<f64> = aggregates.iter().map(|a| a.frequency as f64).collect();
        let distribution = FrequencyDistribution::from_values(&mut frequencies);

        let mut retained = Vec::new();
        for agg in aggregates {
            if agg.frequency < self.min_frequency {
                discards.add(DiscardReason::BelowFrequency);
            } else if agg.template_match_count() < self.min_template_count {
                discards.add(DiscardReason::BelowTemplateCount);
            } else {
                retained.push(agg);
            }
        }

        retained.sort_by(|a, b| {
            b.cross_validation_score()
                .cmp(&a.cross_validation_score())
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.variable_text.cmp(&b.variable_text))
        });

        VariableValidation {
            retained,
            unique_variables,
            distribution,
            discards,
        }
    }
}

/// Outcome of template filtering
#[derive(Debug, Clone, Default)]
pub struct TemplateFiltering {
    /// Retained templates, by match count desc then pattern asc
    pub retained: Vec<TemplatePattern>,
    /// Match-count threshold that was applied
    pub threshold: f64,
    pub discards: DiscardCounts,
}

/// Minimum tokens in a useful template
pub const MIN_TEMPLATE_TOKENS: usize = 2;

/// Drops weak templates by match-count percentile and shape
#[derive(Debug, Clone, Copy)]
pub struct TemplateFilter {
    percentile: f64,
}

impl TemplateFilter {
    pub fn new(percentile: f64) -> Self {
        Self { percentile }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.template_quality_percentile)
    }

    pub fn filter(&self, templates: Vec<TemplatePattern>) -> TemplateFiltering {
        let mut counts: Vec<f64> = templates.iter().map(|t| t.match_count as f64).collect();
        counts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let threshold = percentile(&counts, self.percentile);

        let mut discards = DiscardCounts::default();
        let mut retained = Vec::new();
        for template in templates {
            if template.slot_count() == 0 {
                discards.add(DiscardReason::NoSlots);
            } else if template.token_count() < MIN_TEMPLATE_TOKENS {
                discards.add(DiscardReason::TooShort);
            } else if (template.match_count as f64) < threshold {
                discards.add(DiscardReason::BelowPercentile);
            } else {
                retained.push(template);
            }
        }

        retained.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.pattern_string.cmp(&b.pattern_string))
        });

        TemplateFiltering {
            retained,
            threshold,
            discards,
        }
    }
}
