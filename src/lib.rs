pub mod ai;
pub mod cli;
pub mod commands;
pub mod config;

use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::ai::{OllamaClient, Summarizer};
use crate::cli::{Cli, Commands, SummarizeOptions};
use crate::commands::{ExportData, Outcome};
use crate::config::Config;

/// Log to stderr, `warn` by default. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env().with_host_override(cli.host.as_deref());
    debug!("Using Ollama host: {}", config.host);

    match cli.command {
        Commands::Summarize(options) => summarize(&config, options).await,
        Commands::Models => models(&config).await,
        Commands::Status => status(&config).await,
    }
}

async fn summarize(config: &Config, options: SummarizeOptions) -> anyhow::Result<ExitCode> {
    let summarizer = Summarizer::connect_with_timeout(&config.host, config.timeout);
    let model = config.model_or_default(options.model.as_deref());

    let text = match commands::read_input(options.text.as_deref(), options.file.as_deref()).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{e:#}");
            return Ok(ExitCode::FAILURE);
        }
    };

    match commands::generate_summary(&summarizer, &text, &model, options.prompt.as_deref()).await {
        Outcome::Summary(summary) => {
            println!("{summary}");
            if let Some(target) = options.output {
                let data = ExportData::from_summary(&summary, &model, Utc::now())?;
                let path = commands::save_export(&data, &target)
                    .with_context(|| format!("Failed to save summary to {}", target.display()))?;
                eprintln!("Summary saved to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Warning(message) => {
            eprintln!("{message}");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Error(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn models(config: &Config) -> anyhow::Result<ExitCode> {
    let client = OllamaClient::with_timeout(&config.host, config.timeout)?;

    let installed = match client.list_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!("Could not list models on {}: {}", client.base_url(), e);
            eprintln!(
                "Could not reach Ollama at {}; showing suggested models only.",
                client.base_url()
            );
            Vec::new()
        }
    };

    for entry in commands::merge_models(&installed) {
        let marker = if entry.installed { "installed" } else { "not pulled" };
        println!("{:<24} {}", entry.name, marker);
    }

    Ok(ExitCode::SUCCESS)
}

async fn status(config: &Config) -> anyhow::Result<ExitCode> {
    let client = OllamaClient::with_timeout(&config.host, config.timeout)?;
    let status = commands::get_ollama_status(&client).await;

    if status.running {
        println!(
            "Ollama is running at {} with {} model(s) available.",
            status.host,
            status.models.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "Ollama is not reachable at {}. Ensure the service is running.",
            status.host
        );
        Ok(ExitCode::FAILURE)
    }
}
