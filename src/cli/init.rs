//! Init command - write a phrasemine.toml with example settings

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use phrasemine::config::{UserConfig, CONFIG_FILENAME};

const DEFAULT_CONFIG: &str = r#"# phrasemine configuration
#
# CLI flags override every value here.

[discovery]
# Minimum corpus frequency for an n-gram
min_ngram_frequency = 5
# Longest n-gram window (1-6)
max_ngram_length = 6
# Anchor length range, in tokens
anchor_min_tokens = 3
anchor_max_tokens = 4
# Anchors evaluated per run (each one scans the corpus)
anchor_cap = 100
# Matching phrases inspected when inferring a pattern
inference_sample_size = 20
# Minimum phrases an anchor must match
min_template_match_count = 10
# Templates below this match-count percentile are dropped
template_quality_percentile = 75
# A variable must be extracted this often...
min_variable_frequency = 3
# ...by at least this many distinct templates
min_variable_template_count = 2
# Shorter captures are treated as noise
min_variable_length = 2
# Minimum phrases per seed template (bootstrap)
min_seed_template_frequency = 3
# Seeds match as substrings; set true to require whole tokens
# (leave false for text written without spaces, such as Chinese)
seed_token_edges = false
# Edge-token count before a stop word is suggested
edge_noise_min_count = 50

[stopwords]
# file = "stopwords.txt"
# extra = ["near", "me"]
# replace_defaults = false

[defaults]
# format = "text"
# workers = 8
# top = 25
"#;

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }

    let config_path = path.join(CONFIG_FILENAME);
    if config_path.exists() && !force {
        println!(
            "{}Already initialized at {} (use --force to overwrite)",
            style("✓ ").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{}Created {}",
        style("✓ ").green(),
        style(config_path.display()).cyan()
    );

    if let Some(user_file) = UserConfig::stopwords_path() {
        println!(
            "{}",
            style(format!(
                "User stop words are read from {} when present",
                user_file.display()
            ))
            .dim()
        );
    }

    println!("\nNext steps:");
    println!("  {} Discover templates", style("phrasemine discover <corpus>").cyan());
    println!(
        "  {} Bootstrap from seeds",
        style("phrasemine bootstrap <corpus> --seeds <file>").cyan()
    );

    Ok(())
}
