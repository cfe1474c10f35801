//! Text (terminal) reporter with colors and formatting

use crate::discovery::NgramTable;
use crate::models::{DiscardCounts, RunMode, RunReport};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

fn rule() -> String {
    format!("{DIM}──────────────────────────────────────{RESET}\n")
}

/// Truncate to `max` chars, adding an ellipsis
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Render report as formatted terminal output
pub fn render(report: &RunReport, top: usize) -> Result<String> {
    let mut out = String::new();
    let diag = &report.diagnostics;

    let title = match report.mode {
        RunMode::Discover => "Template Discovery",
        RunMode::Bootstrap => "Seed Bootstrap",
    };
    out.push_str(&format!("\n{BOLD}phrasemine: {title}{RESET}\n"));
    out.push_str(&rule());
    out.push_str(&format!(
        "Phrases: {}  Templates: {}  Variables: {}  Retention: {:.1}%\n\n",
        diag.phrase_count,
        report.templates.len(),
        report.variables.len(),
        diag.retention_rate * 100.0
    ));

    if diag.empty_corpus {
        out.push_str(&format!("{YELLOW}Corpus is empty.{RESET}\n"));
        return Ok(out);
    }

    // Templates
    out.push_str(&format!("{BOLD}TEMPLATES{RESET} ({} retained)\n", report.templates.len()));
    if report.templates.is_empty() {
        out.push_str(&format!("  {DIM}none{RESET}\n"));
    } else {
        out.push_str(&format!(
            "{DIM}  #   MATCHES  PATTERN                                  EXAMPLE{RESET}\n"
        ));
        for (i, t) in report.templates.iter().take(top).enumerate() {
            let example = t.example_phrases.first().map(String::as_str).unwrap_or("");
            out.push_str(&format!(
                "  {DIM}{:>3}{RESET}  {:>7}  {CYAN}{:<40}{RESET} {DIM}{}{RESET}\n",
                i + 1,
                t.match_count,
                clip(&t.pattern_string, 40),
                clip(example, 30)
            ));
        }
        let remaining = report.templates.len().saturating_sub(top);
        if remaining > 0 {
            out.push_str(&format!("  {DIM}...and {} more (use --top){RESET}\n", remaining));
        }
    }
    out.push('\n');

    // Variables
    out.push_str(&format!("{BOLD}VARIABLES{RESET} ({} retained)\n", report.variables.len()));
    if report.variables.is_empty() {
        out.push_str(&format!("  {DIM}none{RESET}\n"));
    } else {
        out.push_str(&format!(
            "{DIM}  #   SCORE  FREQ  TMPL  VALUE{RESET}\n"
        ));
        for (i, v) in report.variables.iter().take(top).enumerate() {
            out.push_str(&format!(
                "  {DIM}{:>3}{RESET}  {GREEN}{:>5}{RESET}  {:>4}  {:>4}  {}\n",
                i + 1,
                v.cross_validation_score,
                v.frequency,
                v.template_match_count,
                clip(&v.variable_text, 50)
            ));
        }
        let remaining = report.variables.len().saturating_sub(top);
        if remaining > 0 {
            out.push_str(&format!("  {DIM}...and {} more (use --top){RESET}\n", remaining));
        }
    }
    out.push('\n');

    // Diagnostics
    out.push_str(&format!("{BOLD}DIAGNOSTICS{RESET}\n"));
    if report.mode == RunMode::Discover {
        let by_length: Vec<String> = diag
            .ngram_counts_by_length
            .iter()
            .map(|(n, count)| format!("{}:{}", n, count))
            .collect();
        out.push_str(&format!("  N-grams by length: {}\n", by_length.join("  ")));
        out.push_str(&format!(
            "  Anchors: {} evaluated of {} candidates\n",
            diag.anchors_evaluated, diag.anchor_candidates
        ));
        out.push_str(&format!(
            "  Template threshold: {:.1} matches\n",
            diag.template_threshold
        ));
    }
    out.push_str(&format!(
        "  Extraction records: {}  Unique values: {}\n",
        diag.extraction_records, diag.unique_variables
    ));
    let dist = &diag.variable_frequency;
    out.push_str(&format!(
        "  Value frequency: mean {:.1}  p50 {:.1}  p75 {:.1}  p90 {:.1}  max {:.0}\n",
        dist.mean, dist.p50, dist.p75, dist.p90, dist.max
    ));
    push_discards(&mut out, "Template discards", &diag.template_discards);
    push_discards(&mut out, "Variable discards", &diag.variable_discards);
    for err in &diag.compile_errors {
        out.push_str(&format!("  {YELLOW}compile error:{RESET} {}\n", err));
    }

    if let Some(edge) = &report.edge_analysis {
        if !edge.suggested_stopwords.is_empty() {
            let words: Vec<String> = edge
                .suggested_stopwords
                .iter()
                .map(|row| format!("{} ({})", row.value, row.count))
                .collect();
            out.push_str(&format!(
                "\n{BOLD}SUGGESTED STOP WORDS{RESET} (review before adding)\n  {}\n",
                words.join(", ")
            ));
        }
    }

    if !report.next_seeds.is_empty() {
        out.push_str(&format!(
            "\n{DIM}{} new seed candidates (use --emit-seeds to save them).{RESET}\n",
            report.next_seeds.len()
        ));
    }

    Ok(out)
}

fn push_discards(out: &mut String, label: &str, counts: &DiscardCounts) {
    if counts.total() == 0 {
        out.push_str(&format!("  {}: none\n", label));
        return;
    }
    let parts: Vec<String> = counts
        .0
        .iter()
        .map(|(reason, n)| format!("{} {}", n, reason))
        .collect();
    out.push_str(&format!("  {}: {}\n", label, parts.join(", ")));
}

/// Render the most frequent n-grams, grouped by length
pub fn render_ngrams(table: &NgramTable, top: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}N-GRAMS{RESET} ({} kept)\n", table.len()));
    out.push_str(&rule());
    for (n, grams) in table.top_by_length(top) {
        out.push_str(&format!("{BOLD}{}-grams{RESET}\n", n));
        for g in grams {
            out.push_str(&format!("  {GREEN}{:>7}{RESET}  {}\n", g.frequency, g.text()));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::NgramAnalyzer;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_sections() {
        let out = render(&test_report(), 10).unwrap();
        assert!(out.contains("Seed Bootstrap"));
        assert!(out.contains("best {SLOT} app"));
        assert!(out.contains("VARIABLES"));
        assert!(out.contains("new seed candidates"));
    }

    #[test]
    fn test_text_top_limit() {
        let out = render(&test_report(), 1).unwrap();
        assert!(out.contains("...and 1 more"));
    }

    #[test]
    fn test_text_empty_corpus() {
        let mut report = test_report();
        report.diagnostics.empty_corpus = true;
        let out = render(&report, 10).unwrap();
        assert!(out.contains("Corpus is empty"));
    }

    #[test]
    fn test_clip_is_char_safe() {
        assert_eq!(clip("crème brûlée recipe", 8), "crème...");
        assert_eq!(clip("short", 8), "short");
    }

    #[test]
    fn test_render_ngrams() {
        let table = NgramAnalyzer::new(1, 2).analyze(&["how to cook", "how to bake"]);
        let out = render_ngrams(&table, 1);
        assert!(out.contains("1-grams"));
        assert!(out.contains("how to"));
    }
}
