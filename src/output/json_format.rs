//! JSON report output.

use crate::error::{OutputError, OutputResult};
use crate::scanner::ScanReport;
use std::fs;
use std::path::Path;
use tracing::info;

/// Render a report as pretty-printed JSON text.
pub fn render_report(report: &ScanReport) -> OutputResult<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

/// Write a report to `path`, replacing any existing file.
pub fn write_report(report: &ScanReport, path: &Path) -> OutputResult<()> {
    let json = render_report(report)?;
    fs::write(path, json).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "report written");
    Ok(())
}
