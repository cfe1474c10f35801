//! Ngrams command - inspect n-gram frequencies

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::{configure_workers, load_config, load_corpus, spinner};
use phrasemine::discovery::NgramAnalyzer;
use phrasemine::models::NGram;
use phrasemine::reporters::render_ngrams;

#[derive(Serialize)]
struct NgramRow {
    ngram: String,
    length: usize,
    frequency: u64,
}

impl From<NGram> for NgramRow {
    fn from(g: NGram) -> Self {
        Self {
            ngram: g.text(),
            length: g.len(),
            frequency: g.frequency,
        }
    }
}

pub fn run(
    corpus: &Path,
    length: Option<usize>,
    top: usize,
    min_frequency: Option<u64>,
    format: &str,
    config: Option<&Path>,
    workers: Option<usize>,
) -> Result<()> {
    let project = load_config(config)?;
    configure_workers(workers, &project);

    let min_frequency = min_frequency.unwrap_or(project.discovery.min_ngram_frequency);
    let max_window = length.unwrap_or(project.discovery.max_ngram_length);

    let phrases = load_corpus(corpus)?;
    let texts: Vec<&str> = phrases.iter().map(|p| p.text.as_str()).collect();

    let bar = spinner("Counting n-grams...");
    let mut table = NgramAnalyzer::new(min_frequency, max_window).analyze(&texts);
    bar.finish_and_clear();

    if let Some(n) = length {
        table = table.retain_length(n);
    }

    if format == "json" {
        let rows: Vec<NgramRow> = table
            .top_by_length(top)
            .into_values()
            .flatten()
            .map(NgramRow::from)
            .collect();
        let json = serde_json::to_string_pretty(&rows).context("Cannot serialize n-grams")?;
        println!("{}", json);
    } else {
        println!("{}", render_ngrams(&table, top));
    }
    Ok(())
}
