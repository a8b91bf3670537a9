use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the summary is empty")]
    EmptySummary,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    pub markdown: String,
    pub filename: String,
}

impl ExportData {
    pub fn from_summary(
        summary: &str,
        model: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ExportError> {
        if summary.trim().is_empty() {
            return Err(ExportError::EmptySummary);
        }

        let mut md = String::new();
        md.push_str("# Summary\n\n");
        md.push_str(&format!("**Model:** {}\n", model));
        md.push_str(&format!(
            "**Generated:** {}\n",
            generated_at.format("%B %d, %Y at %H:%M UTC")
        ));
        md.push_str("\n---\n\n");
        md.push_str(summary.trim());
        md.push_str("\n\n---\n\n");
        md.push_str("*Generated with Ollama Summarizer*\n");

        let filename = format!(
            "summary_{}_{}.md",
            safe_file_component(model),
            generated_at.format("%Y%m%d_%H%M%S")
        );

        Ok(Self { markdown: md, filename })
    }
}

/// Write the export to `target`. An existing directory receives the export
/// under its generated filename; anything else is taken as the file path.
pub fn save_export(data: &ExportData, target: &Path) -> Result<PathBuf, ExportError> {
    let file_path = if target.is_dir() {
        target.join(&data.filename)
    } else {
        target.to_path_buf()
    };

    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, &data.markdown)?;

    Ok(file_path)
}

fn safe_file_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "model".to_string()
    } else {
        cleaned.to_string()
    }
}
