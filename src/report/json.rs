//! JSON report

use super::Report;
use crate::error::{Result, SnitchError};

/// Render the report as pretty-printed JSON
///
/// Absent recommendations and reason codes are written as `null` so every
/// finding carries the same five keys.
pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| SnitchError::render("JSON", e.to_string()))
}
