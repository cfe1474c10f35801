//! End-to-end tests for the discovery library API

use std::collections::BTreeSet;

use phrasemine::config::{DiscoveryConfig, StopWords};
use phrasemine::discovery::{
    tokenize, CompiledMatcher, CrossValidator, MatchBoundary, SeedBootstrapper,
    TemplateInferencer, TokenizedCorpus, VariableExtractor,
};
use phrasemine::models::{AnchorPosition, DiscardReason, Phrase};
use phrasemine::pipeline::Pipeline;
use proptest::prelude::*;

fn phrases(texts: &[&str]) -> Vec<Phrase> {
    texts.iter().copied().map(Phrase::from).collect()
}

fn repeat(text: &str, n: usize) -> Vec<Phrase> {
    (0..n).map(|_| Phrase::from(text)).collect()
}

#[test]
fn test_leading_anchor_template() {
    let texts = ["best coffee maker", "best coffee machine", "best espresso maker"];
    let corpus = TokenizedCorpus::new(&texts);
    let template = TemplateInferencer::new(1, 20)
        .infer(&tokenize("best coffee"), &corpus)
        .unwrap();

    assert_eq!(template.pattern_string, "best coffee {SLOT}");
    assert_eq!(template.match_count, 2);
    assert_eq!(template.position, Some(AnchorPosition::Leading));
    assert_eq!(
        template.example_phrases,
        vec!["best coffee maker", "best coffee machine"]
    );
}

#[test]
fn test_dotted_capital_i_template_matches_its_phrases() {
    let texts = ["İstanbul hotel deals", "İstanbul hotel prices", "İstanbul hotel reviews"];
    let corpus = TokenizedCorpus::new(&texts);
    let template = TemplateInferencer::new(1, 20)
        .infer(&tokenize("İstanbul hotel"), &corpus)
        .unwrap();
    assert_eq!(template.pattern_string, "istanbul hotel {SLOT}");

    let matcher = CompiledMatcher::compile(&template.pattern_string).unwrap();
    assert!(texts.iter().all(|t| matcher.find(t).is_some()));
}

#[test]
fn test_seed_bootstrap_unsegmented_text() {
    let corpus = phrases(&["闲鱼上卖手机", "闲鱼上卖电脑", "闲鱼上卖相机", "手机怎么卖"]);
    let built = SeedBootstrapper::new(1).build(&["手机"], &corpus);
    let patterns: Vec<&str> = built
        .templates
        .iter()
        .map(|t| t.pattern_string.as_str())
        .collect();
    assert_eq!(patterns, vec!["{SLOT}怎么卖", "闲鱼上卖{SLOT}"]);

    let matcher = CompiledMatcher::compile_with("闲鱼上卖{SLOT}", MatchBoundary::Anywhere).unwrap();
    let record = VariableExtractor::new(2)
        .extract(&matcher, &Phrase::from("在闲鱼上卖电脑"))
        .unwrap();
    assert_eq!(record.slot_values, vec![Some("电脑".to_string())]);
    assert_eq!(record.reconstruct(), "在闲鱼上卖电脑");
}

#[test]
fn test_cross_validated_variable_score() {
    let mut corpus = repeat("how to cook rice", 5);
    corpus.push(Phrase::from("cook rice recipe"));

    let matchers = vec![
        CompiledMatcher::compile("how to {SLOT}").unwrap(),
        CompiledMatcher::compile("{SLOT} recipe").unwrap(),
    ];
    let records = VariableExtractor::new(2).extract_all(&matchers, &corpus);
    assert_eq!(records.len(), 6);

    let validation = CrossValidator::new(1, 2).validate(&records, &BTreeSet::new());
    let cook_rice = validation
        .retained
        .iter()
        .find(|v| v.variable_text == "cook rice")
        .unwrap();
    assert_eq!(cook_rice.frequency, 6);
    assert_eq!(cook_rice.template_match_count(), 2);
    assert_eq!(cook_rice.cross_validation_score(), 12);
}

#[test]
fn test_min_variable_length_boundary() {
    let matcher = CompiledMatcher::compile("what {SLOT} good").unwrap();
    let extractor = VariableExtractor::new(2);

    let kept = extractor
        .extract(&matcher, &Phrase::from("what is good"))
        .unwrap();
    assert_eq!(kept.slot_values, vec![Some("is".to_string())]);

    let dropped = extractor
        .extract(&matcher, &Phrase::from("what i good"))
        .unwrap();
    assert_eq!(dropped.slot_values, vec![None]);
}

#[test]
fn test_seed_bootstrap_templates() {
    let corpus = phrases(&["best android app", "android vs ios"]);
    let built = SeedBootstrapper::new(1).build(&["android"], &corpus);

    let found: Vec<(&str, usize)> = built
        .templates
        .iter()
        .map(|t| (t.pattern_string.as_str(), t.match_count))
        .collect();
    assert_eq!(found, vec![("best {SLOT} app", 1), ("{SLOT} vs ios", 1)]);
}

#[test]
fn test_pipeline_discovers_shared_variables() {
    let corpus = phrases(&[
        "cheap flights to paris",
        "cheap flights to rome",
        "cheap flights to tokyo",
        "paris hotel deals today",
        "rome hotel deals today",
        "tokyo hotel deals today",
        "cheap flights to nowhere",
    ]);
    let config = DiscoveryConfig {
        min_ngram_frequency: 2,
        anchor_min_tokens: 3,
        anchor_max_tokens: 3,
        min_template_match_count: 3,
        template_quality_percentile: 0.0,
        min_variable_frequency: 2,
        min_variable_template_count: 2,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config, StopWords::default_english()).unwrap();
    let report = pipeline.discover(&corpus);

    let values: Vec<&str> = report
        .variables
        .iter()
        .map(|v| v.variable_text.as_str())
        .collect();
    assert_eq!(values, vec!["paris", "rome", "tokyo"]);
    // "nowhere" only fits one template
    assert!(
        report
            .diagnostics
            .variable_discards
            .get(DiscardReason::BelowFrequency)
            >= 1
    );
    assert_eq!(report.diagnostics.phrase_count, 7);
}

#[test]
fn test_reports_are_deterministic() {
    let corpus = phrases(&[
        "best shoes for running",
        "best shoes for hiking",
        "best shoes for walking",
        "running socks sale now",
        "hiking socks sale now",
        "walking socks sale now",
    ]);
    let config = DiscoveryConfig {
        min_ngram_frequency: 2,
        anchor_min_tokens: 2,
        min_template_match_count: 2,
        template_quality_percentile: 0.0,
        min_variable_frequency: 2,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config, StopWords::default_english()).unwrap();
    let first = serde_json::to_value(pipeline.discover(&corpus)).unwrap();
    let second = serde_json::to_value(pipeline.discover(&corpus)).unwrap();

    assert_eq!(first["templates"], second["templates"]);
    assert_eq!(first["variables"], second["variables"]);
    assert_eq!(first["diagnostics"], second["diagnostics"]);
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn words(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 1..=max)
}

proptest! {
    #[test]
    fn prop_extraction_reconstructs_phrase(
        lead in prop::collection::vec(word(), 0..3),
        middle in words(3),
        tail in words(3),
    ) {
        let mut parts = lead;
        parts.push("best".to_string());
        parts.extend(middle);
        parts.push("for".to_string());
        parts.extend(tail);
        let text = parts.join(" ");

        let matcher = CompiledMatcher::compile("best {SLOT} for {SLOT2}").unwrap();
        let record = VariableExtractor::new(1)
            .extract(&matcher, &Phrase::from(text.as_str()))
            .unwrap();
        prop_assert_eq!(record.reconstruct(), text);
        prop_assert_eq!(record.slot_values.len(), 2);
    }

    #[test]
    fn prop_higher_frequency_threshold_never_adds_variables(
        values in prop::collection::vec(prop::sample::select(vec!["red", "green", "blue", "teal"]), 1..40),
        low in 1u64..4,
        bump in 0u64..4,
    ) {
        let corpus: Vec<Phrase> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i % 2 == 0 {
                    Phrase::from(format!("buy {v} paint").as_str())
                } else {
                    Phrase::from(format!("{v} paint ideas").as_str())
                }
            })
            .collect();
        let matchers = vec![
            CompiledMatcher::compile("buy {SLOT} paint").unwrap(),
            CompiledMatcher::compile("{SLOT} paint ideas").unwrap(),
        ];
        let records = VariableExtractor::new(2).extract_all(&matchers, &corpus);

        let none = BTreeSet::new();
        let loose: BTreeSet<String> = CrossValidator::new(low, 1)
            .validate(&records, &none)
            .retained
            .into_iter()
            .map(|v| v.variable_text)
            .collect();
        let strict: BTreeSet<String> = CrossValidator::new(low + bump, 1)
            .validate(&records, &none)
            .retained
            .into_iter()
            .map(|v| v.variable_text)
            .collect();
        prop_assert!(strict.is_subset(&loose));
    }
}
