//! Output reporters for phrasemine run reports
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON (always the full report)
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

pub use text::render_ngrams;

use crate::models::RunReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Rows shown per table when no limit is given
pub const DEFAULT_TOP: usize = 25;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render a run report using an OutputFormat enum.
///
/// `top` limits templates and variables in text and Markdown output.
pub fn report_with_format(report: &RunReport, format: OutputFormat, top: usize) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report, top),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report, top),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small bootstrap-style report covering every section
    pub(crate) fn test_report() -> RunReport {
        use crate::config::StopWords;
        use crate::config::DiscoveryConfig;
        use crate::models::Phrase;
        use crate::pipeline::Pipeline;

        let config = DiscoveryConfig {
            min_seed_template_frequency: 1,
            min_variable_frequency: 2,
            ..Default::default()
        };
        let phrases: Vec<Phrase> = [
            "best android app",
            "best ios app",
            "best linux app",
            "android vs ios",
            "linux vs ios",
        ]
        .into_iter()
        .map(Phrase::from)
        .collect();

        Pipeline::new(config, StopWords::default_english())
            .map(|p| p.bootstrap(&["android"], &phrases))
            .unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn test_report_fixture() {
        let report = test_report();
        assert_eq!(report.templates.len(), 2);
        assert_eq!(report.variables[0].variable_text, "android");
        assert_eq!(report.next_seeds, vec!["linux".to_string()]);
    }

    #[test]
    fn test_every_format_renders() {
        let report = test_report();
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            let out = report_with_format(&report, format, DEFAULT_TOP).unwrap();
            assert!(out.contains("android"), "{format} output missing variable");
        }
    }
}
