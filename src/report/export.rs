//! Report files on disk

use super::{render_json, render_markdown, Report, ServerLabel};
use crate::error::{IoResultExt, Result};
use std::path::{Path, PathBuf};

/// Common prefix of every exported report file
pub const FILE_PREFIX: &str = "numa_diagnostics_";

/// Writes Markdown and JSON reports into an output directory
#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    /// Create an exporter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Target directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<dir>/numa_diagnostics_<label>.md`
    pub fn markdown_path(&self, label: &ServerLabel) -> PathBuf {
        self.output_dir.join(format!("{}{}.md", FILE_PREFIX, label))
    }

    /// `<dir>/numa_diagnostics_<label>.json`
    pub fn json_path(&self, label: &ServerLabel) -> PathBuf {
        self.output_dir.join(format!("{}{}.json", FILE_PREFIX, label))
    }

    /// Write the Markdown report, replacing any previous file
    pub fn write_markdown(&self, report: &Report) -> Result<PathBuf> {
        let path = self.markdown_path(report.server_label());
        self.write_file(&path, &render_markdown(report))?;
        Ok(path)
    }

    /// Write the JSON report, replacing any previous file
    pub fn write_json(&self, report: &Report) -> Result<PathBuf> {
        let path = self.json_path(report.server_label());
        self.write_file(&path, &render_json(report)?)?;
        Ok(path)
    }

    /// Write both reports, Markdown first
    pub fn write_all(&self, report: &Report) -> Result<(PathBuf, PathBuf)> {
        let markdown = self.write_markdown(report)?;
        let json = self.write_json(report)?;
        Ok((markdown, json))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).with_path(&self.output_dir)?;
        std::fs::write(path, content).with_path(path)?;
        tracing::info!(path = %path.display(), bytes = content.len(), "report written");
        Ok(())
    }
}
