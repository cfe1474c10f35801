//! CLI command definitions and handlers

mod bootstrap;
mod discover;
mod init;
mod ngrams;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use phrasemine::config::{load_config_file, load_project_config, DiscoveryConfig, ProjectConfig};
use phrasemine::models::{Phrase, RunReport};
use phrasemine::reporters::{self, OutputFormat, DEFAULT_TOP};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// phrasemine - mine phrase templates and their variables from search-phrase corpora
#[derive(Parser, Debug)]
#[command(name = "phrasemine")]
#[command(
    version,
    about = "Discover recurring templates in search phrases and extract the variables that fill them",
    long_about = "phrasemine counts n-grams over a corpus of short search phrases, generalizes \
frequent anchors into templates such as `best {SLOT} for {SLOT2}`, extracts the values that \
fill each slot, and keeps the values that several templates agree on.\n\n\
Corpus files hold one phrase per line (optionally `phrase<TAB>weight`) or a JSON array.",
    after_help = "\
Examples:
  phrasemine discover phrases.txt                      Discover templates and variables
  phrasemine discover phrases.txt -f json -o out.json  Full JSON report
  phrasemine bootstrap phrases.txt --seeds seeds.txt   Build templates from seed words
  phrasemine ngrams phrases.txt --length 3             Inspect frequent trigrams
  phrasemine init                                      Write a phrasemine.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes priority
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64, default: all cores)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that produce a run report
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Config file (default: phrasemine.toml or .phrasemine.json in the current directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format: text, json, markdown (or md)
    #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Templates and variables shown in text and Markdown output
    #[arg(long)]
    pub top: Option<usize>,
}

/// Threshold overrides; anything unset comes from the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Minimum n-gram frequency
    #[arg(long)]
    pub min_ngram_frequency: Option<u64>,

    /// Maximum anchors evaluated
    #[arg(long)]
    pub anchor_cap: Option<usize>,

    /// Minimum phrases an anchor must match
    #[arg(long)]
    pub min_template_matches: Option<usize>,

    /// Template match-count percentile (0-100)
    #[arg(long)]
    pub template_percentile: Option<f64>,

    /// Minimum extraction count for a variable
    #[arg(long)]
    pub min_variable_frequency: Option<u64>,

    /// Minimum distinct templates for a variable
    #[arg(long)]
    pub min_variable_templates: Option<usize>,

    /// Minimum variable length in characters
    #[arg(long)]
    pub min_variable_length: Option<usize>,

    /// Minimum phrases per seed template
    #[arg(long)]
    pub min_seed_frequency: Option<usize>,

    /// Only match seeds on whole tokens (default: substring match)
    #[arg(long)]
    pub seed_token_edges: bool,
}

impl ThresholdArgs {
    /// Layer the overrides onto a config
    pub fn apply(&self, config: &mut DiscoveryConfig) {
        if let Some(v) = self.min_ngram_frequency {
            config.min_ngram_frequency = v;
        }
        if let Some(v) = self.anchor_cap {
            config.anchor_cap = v;
        }
        if let Some(v) = self.min_template_matches {
            config.min_template_match_count = v;
        }
        if let Some(v) = self.template_percentile {
            config.template_quality_percentile = v;
        }
        if let Some(v) = self.min_variable_frequency {
            config.min_variable_frequency = v;
        }
        if let Some(v) = self.min_variable_templates {
            config.min_variable_template_count = v;
        }
        if let Some(v) = self.min_variable_length {
            config.min_variable_length = v;
        }
        if let Some(v) = self.min_seed_frequency {
            config.min_seed_template_frequency = v;
        }
        if self.seed_token_edges {
            config.seed_token_edges = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a phrasemine.toml with the default thresholds
    Init {
        /// Directory to write the config into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing phrasemine.toml
        #[arg(long)]
        force: bool,
    },

    /// Discover templates from frequent n-gram anchors and extract their variables
    #[command(after_help = "\
Examples:
  phrasemine discover phrases.txt
  phrasemine discover phrases.json --format markdown -o report.md
  phrasemine discover phrases.txt --anchor-cap 50 --template-percentile 50")]
    Discover {
        /// Corpus file (lines or JSON array)
        corpus: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Build templates from curated seed words, then extract and validate variables
    #[command(after_help = "\
Examples:
  phrasemine bootstrap phrases.txt --seeds seeds.txt
  phrasemine bootstrap phrases.txt --seeds seeds.txt --exclude noise.txt --emit-seeds next.txt")]
    Bootstrap {
        /// Corpus file (lines or JSON array)
        corpus: PathBuf,

        /// Seed words, one per line
        #[arg(long, short = 's')]
        seeds: PathBuf,

        /// Values to drop before aggregation, one per line
        #[arg(long)]
        exclude: Option<PathBuf>,

        /// Write retained variables that are not yet seeds to this file
        #[arg(long)]
        emit_seeds: Option<PathBuf>,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Show the most frequent n-grams in a corpus
    Ngrams {
        /// Corpus file (lines or JSON array)
        corpus: PathBuf,

        /// Only show n-grams of this length (1-6)
        #[arg(long, short = 'n', value_parser = clap::value_parser!(u8).range(1..=6))]
        length: Option<u8>,

        /// N-grams shown per length
        #[arg(long, default_value = "20")]
        top: usize,

        /// Minimum frequency (default: from config)
        #[arg(long)]
        min_frequency: Option<u64>,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { path, force } => init::run(&path, force),

        Commands::Discover {
            corpus,
            report,
            thresholds,
        } => discover::run(&corpus, &report, &thresholds, cli.workers),

        Commands::Bootstrap {
            corpus,
            seeds,
            exclude,
            emit_seeds,
            report,
            thresholds,
        } => bootstrap::run(
            &corpus,
            &seeds,
            exclude.as_deref(),
            emit_seeds.as_deref(),
            &report,
            &thresholds,
            cli.workers,
        ),

        Commands::Ngrams {
            corpus,
            length,
            top,
            min_frequency,
            format,
            config,
        } => ngrams::run(
            &corpus,
            length.map(usize::from),
            top,
            min_frequency,
            &format,
            config.as_deref(),
            cli.workers,
        ),
    }
}

/// Load the project config, from an explicit file or the working directory
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig> {
    let config = match explicit {
        Some(path) => load_config_file(path)?,
        None => {
            let cwd = std::env::current_dir().context("Cannot read current directory")?;
            load_project_config(&cwd)?
        }
    };
    Ok(config)
}

/// Size the rayon global pool; CLI flag beats the config default
pub(crate) fn configure_workers(flag: Option<usize>, project: &ProjectConfig) {
    let Some(workers) = flag.or(project.defaults.workers) else {
        return;
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
    {
        Ok(()) => debug!("Using {} workers", workers),
        Err(e) => warn!("Could not resize worker pool: {}", e),
    }
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar = ProgressBar::new_spinner();
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

/// Load the corpus behind a spinner
pub(crate) fn load_corpus(path: &Path) -> Result<Vec<Phrase>> {
    let bar = spinner(&format!("Loading {}...", path.display()));
    let phrases = phrasemine::corpus::load_phrases(path)
        .with_context(|| format!("Cannot load corpus {}", path.display()))?;
    bar.finish_and_clear();
    eprintln!(
        "{}Loaded {} phrases from {}",
        style("✓ ").green(),
        style(phrases.len()).cyan(),
        style(path.display()).dim()
    );
    Ok(phrases)
}

/// Render a report and write it to a file or stdout
pub(crate) fn emit_report(report: &RunReport, args: &ReportArgs, project: &ProjectConfig) -> Result<()> {
    let format_name = args
        .format
        .clone()
        .or_else(|| project.defaults.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let format: OutputFormat = format_name.parse()?;
    let top = args.top.or(project.defaults.top).unwrap_or(DEFAULT_TOP);

    let output = reporters::report_with_format(report, format, top)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Cannot write report to {}", path.display()))?;
            // stderr keeps stdout clean for machine-readable formats
            eprintln!(
                "\n{}Report written to: {}",
                style("✓ ").green(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", output),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_threshold_overrides() {
        let mut config = DiscoveryConfig::default();
        let args = ThresholdArgs {
            anchor_cap: Some(12),
            template_percentile: Some(50.0),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.anchor_cap, 12);
        assert_eq!(config.template_quality_percentile, 50.0);
        assert_eq!(config.min_ngram_frequency, 5);
        assert!(!config.seed_token_edges);

        let edges = ThresholdArgs {
            seed_token_edges: true,
            ..Default::default()
        };
        edges.apply(&mut config);
        assert!(config.seed_token_edges);
    }

    #[test]
    fn test_cli_parses_bootstrap() {
        let cli = Cli::try_parse_from([
            "phrasemine",
            "--workers",
            "2",
            "bootstrap",
            "corpus.txt",
            "--seeds",
            "seeds.txt",
            "--emit-seeds",
            "next.txt",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Bootstrap {
                seeds,
                emit_seeds,
                report,
                ..
            } => {
                assert_eq!(seeds, PathBuf::from("seeds.txt"));
                assert_eq!(emit_seeds, Some(PathBuf::from("next.txt")));
                assert_eq!(report.format.as_deref(), Some("json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_ngram_length() {
        assert!(Cli::try_parse_from(["phrasemine", "ngrams", "c.txt", "--length", "7"]).is_err());
    }
}
