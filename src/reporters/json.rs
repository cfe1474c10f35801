//! JSON reporter
//!
//! Outputs the full RunReport as pretty-printed JSON, regardless of `--top`.
//! Useful for piping to jq or loading into downstream storage.

use crate::models::RunReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
