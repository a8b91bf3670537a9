use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::ai::{OllamaClient, OllamaModel, PromptTemplate, Summarizer};
use crate::config::DEFAULT_MODELS;

pub const EMPTY_INPUT_WARNING: &str = "Please enter or upload some text to summarize.";

/// What the front end shows after a summarize request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Summary(String),
    Warning(String),
    Error(String),
}

/// Resolve the input text. A file wins over inline text; with neither, stdin
/// is read to the end.
pub async fn read_input(text: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(path) = file {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Error reading file: {}", path.display()))?;
        return String::from_utf8(bytes)
            .with_context(|| format!("Error reading file: {} is not valid UTF-8", path.display()));
    }

    if let Some(text) = text {
        return Ok(text.to_string());
    }

    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("Error reading standard input")?;
    Ok(buf)
}

/// Render a non-blank user template against `text`.
pub fn custom_prompt_for(template: Option<&str>, text: &str) -> Option<String> {
    let template = template.filter(|t| !t.trim().is_empty())?;
    let template = PromptTemplate::new(template);
    if !template.has_placeholder() {
        warn!(
            "custom prompt has no {{text_to_summarize}} placeholder; the input text will not be sent"
        );
    }
    Some(template.render(text))
}

/// Generate a summary for `text`
pub async fn generate_summary(
    summarizer: &Summarizer,
    text: &str,
    model: &str,
    template: Option<&str>,
) -> Outcome {
    if text.trim().is_empty() {
        return Outcome::Warning(EMPTY_INPUT_WARNING.to_string());
    }

    info!("Summarizing using {}...", model);
    let custom_prompt = custom_prompt_for(template, text);

    match summarizer.summarize(text, model, custom_prompt.as_deref()).await {
        Ok(summary) => Outcome::Summary(summary),
        Err(e) if e.is_error() => Outcome::Error(e.to_string()),
        Err(e) => Outcome::Warning(e.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub suggested: bool,
    pub installed: bool,
}

/// Ollama reports untagged models with an explicit `:latest` tag.
fn canonical_model_name(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{name}:latest")
    }
}

fn same_model(a: &str, b: &str) -> bool {
    canonical_model_name(a) == canonical_model_name(b)
}

/// Suggested models first, in order, followed by any other installed models.
pub fn merge_models(installed: &[OllamaModel]) -> Vec<ModelEntry> {
    let is_installed = |name: &str| installed.iter().any(|m| same_model(&m.name, name));

    let mut entries: Vec<ModelEntry> = DEFAULT_MODELS
        .iter()
        .map(|name| ModelEntry {
            name: name.to_string(),
            suggested: true,
            installed: is_installed(name),
        })
        .collect();

    for model in installed {
        if !entries.iter().any(|e| same_model(&e.name, &model.name)) {
            entries.push(ModelEntry {
                name: model.name.clone(),
                suggested: false,
                installed: true,
            });
        }
    }

    entries
}

#[derive(Debug, Serialize)]
pub struct OllamaStatus {
    pub host: String,
    pub running: bool,
    pub models: Vec<OllamaModel>,
}

/// Check if Ollama is running and get available models
pub async fn get_ollama_status(client: &OllamaClient) -> OllamaStatus {
    let running = client.is_running().await;

    let models = if running {
        client.list_models().await.unwrap_or_default()
    } else {
        vec![]
    };

    OllamaStatus {
        host: client.base_url().to_string(),
        running,
        models,
    }
}
