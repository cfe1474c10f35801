//! Discover command - anchor-driven template discovery

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::time::Instant;

use super::{configure_workers, emit_report, load_config, load_corpus, spinner, ReportArgs, ThresholdArgs};
use phrasemine::pipeline::Pipeline;

pub fn run(
    corpus: &Path,
    report_args: &ReportArgs,
    thresholds: &ThresholdArgs,
    workers: Option<usize>,
) -> Result<()> {
    let start = Instant::now();

    let mut project = load_config(report_args.config.as_deref())?;
    thresholds.apply(&mut project.discovery);
    configure_workers(workers, &project);

    let stopwords = project.stopword_snapshot()?;
    let pipeline = Pipeline::new(project.discovery.clone(), stopwords)
        .context("Invalid discovery configuration")?;

    let phrases = load_corpus(corpus)?;

    let bar = spinner("Discovering templates...");
    let report = pipeline.discover(&phrases);
    bar.finish_and_clear();
    eprintln!(
        "{}Found {} templates and {} variables in {:.2?}",
        style("✓ ").green(),
        style(report.templates.len()).cyan(),
        style(report.variables.len()).cyan(),
        start.elapsed()
    );

    emit_report(&report, report_args, &project)
}
