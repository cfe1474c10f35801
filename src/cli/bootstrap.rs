//! Bootstrap command - seed-driven templates

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::{configure_workers, emit_report, load_config, load_corpus, spinner, ReportArgs, ThresholdArgs};
use phrasemine::corpus::{load_word_list, write_word_list};
use phrasemine::pipeline::Pipeline;

pub fn run(
    corpus: &Path,
    seeds_path: &Path,
    exclude_path: Option<&Path>,
    emit_seeds: Option<&Path>,
    report_args: &ReportArgs,
    thresholds: &ThresholdArgs,
    workers: Option<usize>,
) -> Result<()> {
    let mut project = load_config(report_args.config.as_deref())?;
    thresholds.apply(&mut project.discovery);
    configure_workers(workers, &project);

    let seeds = load_word_list(seeds_path)
        .with_context(|| format!("Cannot load seeds {}", seeds_path.display()))?;
    if seeds.is_empty() {
        anyhow::bail!("Seed file {} has no entries", seeds_path.display());
    }
    let excluded = match exclude_path {
        Some(path) => load_word_list(path)
            .with_context(|| format!("Cannot load exclusions {}", path.display()))?,
        None => Vec::new(),
    };

    let stopwords = project.stopword_snapshot()?;
    let pipeline = Pipeline::new(project.discovery.clone(), stopwords)
        .context("Invalid discovery configuration")?
        .with_excluded_variables(&excluded);

    let phrases = load_corpus(corpus)?;

    let bar = spinner(&format!("Bootstrapping from {} seeds...", seeds.len()));
    let report = pipeline.bootstrap(&seeds, &phrases);
    bar.finish_and_clear();
    eprintln!(
        "{}Built {} templates, kept {} variables",
        style("✓ ").green(),
        style(report.templates.len()).cyan(),
        style(report.variables.len()).cyan()
    );

    if let Some(path) = emit_seeds {
        write_word_list(path, &report.next_seeds)
            .with_context(|| format!("Cannot write seeds to {}", path.display()))?;
        eprintln!(
            "{}Wrote {} seed candidates to {}",
            style("✓ ").green(),
            style(report.next_seeds.len()).cyan(),
            style(path.display()).cyan()
        );
    }

    emit_report(&report, report_args, &project)
}
