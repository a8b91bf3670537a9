//! Runtime configuration.
//!
//! Values are resolved in order of precedence:
//! 1. Command-line flags
//! 2. Environment variables (`OLLAMA_HOST`, `OLLAMA_MODEL`, `OLLAMA_TIMEOUT_SECS`)
//! 3. Built-in defaults

use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::ollama::OLLAMA_BASE_URL;

pub const HOST_ENV: &str = "OLLAMA_HOST";
pub const MODEL_ENV: &str = "OLLAMA_MODEL";
pub const TIMEOUT_ENV: &str = "OLLAMA_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "llama3";

/// Models suggested to the user. They still have to be pulled on the server.
pub const DEFAULT_MODELS: [&str; 5] = [
    "llama3.2:latest",
    "llama3",
    "mistral",
    "phi3",
    "gemma:2b",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Ollama server
    pub host: String,
    /// Model used when none is given on the command line
    pub default_model: String,
    /// Per-request timeout; unset means wait for the server indefinitely
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: OLLAMA_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, ignoring blank values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = non_blank(HOST_ENV) {
            debug!("Loading {} from environment: {}", HOST_ENV, host);
            config.host = host;
        }

        if let Some(model) = non_blank(MODEL_ENV) {
            debug!("Loading {} from environment: {}", MODEL_ENV, model);
            config.default_model = model;
        }

        if let Some(timeout_str) = non_blank(TIMEOUT_ENV) {
            match timeout_str.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    debug!("Loading {} from environment: {}", TIMEOUT_ENV, secs);
                    config.timeout = Some(Duration::from_secs(secs));
                }
                _ => warn!("Invalid {} value: {}", TIMEOUT_ENV, timeout_str),
            }
        }

        config
    }

    /// Apply a command-line host override
    pub fn with_host_override(mut self, host: Option<&str>) -> Self {
        if let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) {
            self.host = host.to_string();
        }
        self
    }

    /// The model to use: an explicit, non-blank choice or the default
    pub fn model_or_default(&self, model: Option<&str>) -> String {
        model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string()
    }
}
