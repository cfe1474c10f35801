//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - Review documents shared with curators
//! - Pull request comments on taxonomy changes

use crate::models::{DiscardCounts, RunMode, RunReport};
use anyhow::Result;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &RunReport, top: usize) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');
    md.push_str(&render_templates(report, top));
    md.push('\n');
    md.push_str(&render_variables(report, top));
    md.push('\n');
    md.push_str(&render_diagnostics(report));

    if let Some(section) = render_edges(report) {
        md.push('\n');
        md.push_str(&section);
    }

    if !report.next_seeds.is_empty() {
        md.push_str("\n## Next Seeds\n\n");
        for seed in report.next_seeds.iter().take(top) {
            md.push_str(&format!("- {}\n", escape(seed)));
        }
    }

    md.push_str("\n---\n\n*Generated by phrasemine*\n");
    Ok(md)
}

/// Escape characters that break table cells
fn escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn render_header(report: &RunReport) -> String {
    let title = match report.mode {
        RunMode::Discover => "Template Discovery Report",
        RunMode::Bootstrap => "Seed Bootstrap Report",
    };
    let diag = &report.diagnostics;
    format!(
        r#"# {}

Generated: {}

| Metric | Value |
|--------|-------|
| Phrases | {} |
| Templates | {} |
| Variables | {} |
| Retention rate | {:.1}% |
"#,
        title,
        report.generated_at,
        diag.phrase_count,
        report.templates.len(),
        report.variables.len(),
        diag.retention_rate * 100.0
    )
}

fn render_templates(report: &RunReport, top: usize) -> String {
    let mut md = String::from("## Templates\n\n");
    if report.templates.is_empty() {
        md.push_str("_No templates retained._\n");
        return md;
    }

    md.push_str("| # | Pattern | Matches | Examples |\n");
    md.push_str("|---|---------|---------|----------|\n");
    for (i, t) in report.templates.iter().take(top).enumerate() {
        let examples: Vec<String> = t.example_phrases.iter().take(3).map(|e| escape(e)).collect();
        md.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            i + 1,
            escape(&t.pattern_string),
            t.match_count,
            examples.join("; ")
        ));
    }
    md
}

fn render_variables(report: &RunReport, top: usize) -> String {
    let mut md = String::from("## Variables\n\n");
    if report.variables.is_empty() {
        md.push_str("_No variables retained._\n");
        return md;
    }

    md.push_str("| # | Value | Frequency | Templates | Score |\n");
    md.push_str("|---|-------|-----------|-----------|-------|\n");
    for (i, v) in report.variables.iter().take(top).enumerate() {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            escape(&v.variable_text),
            v.frequency,
            v.template_match_count,
            v.cross_validation_score
        ));
    }
    md
}

fn discard_rows(md: &mut String, stage: &str, counts: &DiscardCounts) {
    for (reason, n) in &counts.0 {
        md.push_str(&format!("| {} | {} | {} |\n", stage, reason, n));
    }
}

fn render_diagnostics(report: &RunReport) -> String {
    let diag = &report.diagnostics;
    let dist = &diag.variable_frequency;
    let mut md = String::from("## Diagnostics\n\n");

    if diag.empty_corpus {
        md.push_str("> The corpus was empty.\n\n");
    }

    if report.mode == RunMode::Discover {
        md.push_str(&format!(
            "- Anchors evaluated: {} of {} candidates\n- Template threshold: {:.1} matches\n",
            diag.anchors_evaluated, diag.anchor_candidates, diag.template_threshold
        ));
    }
    md.push_str(&format!(
        "- Extraction records: {}\n- Unique values: {}\n- Value frequency: mean {:.1}, P25 {:.1}, P50 {:.1}, P75 {:.1}, P90 {:.1}, max {:.0}\n\n",
        diag.extraction_records,
        diag.unique_variables,
        dist.mean,
        dist.p25,
        dist.p50,
        dist.p75,
        dist.p90,
        dist.max
    ));

    if diag.template_discards.total() + diag.variable_discards.total() > 0 {
        md.push_str("| Stage | Reason | Count |\n|-------|--------|-------|\n");
        discard_rows(&mut md, "template", &diag.template_discards);
        discard_rows(&mut md, "variable", &diag.variable_discards);
    }

    if !diag.compile_errors.is_empty() {
        md.push_str("\n**Compile errors**\n\n");
        for err in &diag.compile_errors {
            md.push_str(&format!("- `{}`\n", err));
        }
    }
    md
}

fn render_edges(report: &RunReport) -> Option<String> {
    let edge = report.edge_analysis.as_ref()?;
    let mut md = String::from("## Variable Edges\n\n");

    let tokens = |rows: &[crate::discovery::edge_analysis::EdgeCount]| -> String {
        rows.iter()
            .take(10)
            .map(|r| format!("{} ({})", escape(&r.value), r.count))
            .collect::<Vec<_>>()
            .join(", ")
    };
    md.push_str(&format!("- First tokens: {}\n", tokens(&edge.first_tokens)));
    md.push_str(&format!("- Last tokens: {}\n", tokens(&edge.last_tokens)));

    if !edge.suggested_stopwords.is_empty() {
        md.push_str(&format!(
            "\n**Suggested stop words** (advisory): {}\n",
            tokens(&edge.suggested_stopwords)
        ));
    }
    Some(md)
}
