use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::ollama::{ChatBackend, ChatRequest, OllamaClient, OllamaError};
use crate::ai::prompts::SummaryPrompts;

/// Prefixes that mark a rendered result as an error rather than a summary.
pub const ERROR_PREFIXES: [&str; 3] = [
    "Error:",
    "Ollama API Error:",
    "An unexpected error occurred:",
];

/// True if a rendered result starts with one of the `ERROR_PREFIXES`.
pub fn is_error_message(message: &str) -> bool {
    ERROR_PREFIXES.iter().any(|prefix| message.starts_with(prefix))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("Input text is empty.")]
    EmptyInput,

    #[error("Ollama client not initialized. Check OLLAMA_HOST ({host}) and Ollama service.")]
    ClientUnavailable { host: String },

    #[error(
        "Error: Model '{model}' not found on Ollama server ({host}). Please ensure it is pulled. Inside Docker, use: docker exec -it ollama_service ollama pull {model}"
    )]
    ModelNotFound { model: String, host: String },

    #[error(
        "Ollama API Error: Could not connect to Ollama at {host}. Ensure Ollama service is running and accessible. Details: {details}"
    )]
    ConnectionRefused { host: String, details: String },

    #[error("Ollama API Error ({}): {message}", status_label(.status))]
    Protocol { status: Option<u16>, message: String },

    #[error(
        "Ollama Connection Error: Could not connect to Ollama at {host}. Network issue: {details}"
    )]
    Transport { host: String, details: String },

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "N/A".to_string(), |s| s.to_string())
}

impl SummarizeError {
    /// Classify a backend failure for a call against `model` on `host`.
    pub fn from_backend(err: OllamaError, model: &str, host: &str) -> Self {
        let model_not_found = || SummarizeError::ModelNotFound {
            model: model.to_string(),
            host: host.to_string(),
        };
        let refused = |details: String| SummarizeError::ConnectionRefused {
            host: host.to_string(),
            details,
        };

        match err {
            OllamaError::ModelNotFound(_) => model_not_found(),
            OllamaError::ConnectionRefused(details) => refused(details),
            OllamaError::Api { status, message } => {
                let lowered = message.to_lowercase();
                if status == Some(404) || lowered.contains("model not found") {
                    model_not_found()
                } else if status == Some(503) || lowered.contains("connection refused") {
                    refused(message)
                } else {
                    SummarizeError::Protocol { status, message }
                }
            }
            OllamaError::Transport(details) => SummarizeError::Transport {
                host: host.to_string(),
                details,
            },
            OllamaError::InvalidHost { .. } => SummarizeError::ClientUnavailable {
                host: host.to_string(),
            },
            OllamaError::InvalidResponse(e) => SummarizeError::Unexpected(e),
        }
    }

    /// Everything except empty input is a failure; empty input is a warning.
    pub fn is_error(&self) -> bool {
        !matches!(self, SummarizeError::EmptyInput)
    }
}

/// Builds the prompt, calls the inference server once, and cleans up the reply.
#[derive(Clone)]
pub struct Summarizer {
    backend: Option<Arc<dyn ChatBackend>>,
    host: String,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let host = backend.host().to_string();
        Self {
            backend: Some(backend),
            host,
        }
    }

    /// A summarizer whose client could not be built. Every call reports
    /// `ClientUnavailable`.
    pub fn unavailable(host: impl Into<String>) -> Self {
        Self {
            backend: None,
            host: host.into(),
        }
    }

    /// Build an HTTP client for `host`, falling back to the unavailable state.
    pub fn connect(host: &str) -> Self {
        Self::connect_with_timeout(host, None)
    }

    pub fn connect_with_timeout(host: &str, timeout: Option<Duration>) -> Self {
        match OllamaClient::with_timeout(host, timeout) {
            Ok(client) => Self::new(Arc::new(client)),
            Err(e) => {
                warn!("Error initializing Ollama client with host {}: {}", host, e);
                Self::unavailable(host)
            }
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Summarize `text` with `model`. A non-empty `custom_prompt` is sent as
    /// the whole prompt; otherwise the default template wraps `text`.
    pub async fn summarize(
        &self,
        text: &str,
        model: &str,
        custom_prompt: Option<&str>,
    ) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| SummarizeError::ClientUnavailable {
                host: self.host.clone(),
            })?;

        let prompt = resolve_prompt(text, custom_prompt);
        debug!(model, prompt_len = prompt.len(), "resolved prompt");

        let response = backend
            .chat(ChatRequest::single(model, &prompt))
            .await
            .map_err(|e| {
                let classified = SummarizeError::from_backend(e, model, &self.host);
                warn!(model, error = %classified, "summarization failed");
                classified
            })?;

        info!(model, "summary generated");
        Ok(clean_summary(&response.message.content))
    }

    /// Same as `summarize`, rendering failures into their user-facing text.
    pub async fn summarize_to_message(
        &self,
        text: &str,
        model: &str,
        custom_prompt: Option<&str>,
    ) -> String {
        match self.summarize(text, model, custom_prompt).await {
            Ok(summary) => summary,
            Err(e) => e.to_string(),
        }
    }
}

fn resolve_prompt(text: &str, custom_prompt: Option<&str>) -> String {
    match custom_prompt {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => SummaryPrompts::default_summary(text),
    }
}

/// Strip markdown emphasis asterisks and surrounding whitespace.
fn clean_summary(content: &str) -> String {
    content.replace('*', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::ai::ollama::{ChatMessage, ChatResponse, Role};

    /// Deterministic backend that replays a fixed outcome and records requests.
    struct MockBackend {
        reply: Result<String, OllamaError>,
        calls: AtomicUsize,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl MockBackend {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(content.to_string()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: OllamaError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().messages[0].content.clone()
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        fn host(&self) -> &str {
            "http://mock:11434"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, OllamaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map(|content| ChatResponse {
                model: request.model,
                message: ChatMessage {
                    role: Role::Assistant,
                    content,
                },
                done: true,
            })
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_network() {
        let backend = MockBackend::replying("unused");
        let summarizer = Summarizer::new(backend.clone());

        for text in ["", "   ", "\n\t  \n"] {
            let message = summarizer.summarize_to_message(text, "llama3", None).await;
            assert_eq!(message, "Input text is empty.");
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_prompt_is_sent_verbatim() {
        let backend = MockBackend::replying("ok");
        let summarizer = Summarizer::new(backend.clone());
        let custom = "Summarize in one sentence: {not a placeholder} body";

        summarizer.summarize("body", "mistral", Some(custom)).await.unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "mistral");
        assert_eq!(requests[0].messages, vec![ChatMessage::user(custom)]);
        assert!(!requests[0].stream);
    }

    #[tokio::test]
    async fn test_empty_custom_prompt_uses_default_template() {
        let backend = MockBackend::replying("ok");
        let summarizer = Summarizer::new(backend.clone());
        let text = "Rust is a systems programming language.";

        summarizer.summarize(text, "llama3", Some("")).await.unwrap();
        assert_eq!(backend.last_prompt(), SummaryPrompts::default_summary(text));

        summarizer.summarize(text, "llama3", None).await.unwrap();
        assert_eq!(backend.last_prompt(), SummaryPrompts::default_summary(text));
        assert!(backend.last_prompt().contains(text));
    }

    #[tokio::test]
    async fn test_reply_is_stripped_of_asterisks_and_trimmed() {
        let summarizer = Summarizer::new(MockBackend::replying("  A *great* summary.\n"));
        let summary = summarizer.summarize("text", "llama3", None).await.unwrap();
        assert_eq!(summary, "A great summary.");

        let summarizer = Summarizer::new(MockBackend::replying("**Key points**\n* one"));
        let summary = summarizer.summarize("text", "llama3", None).await.unwrap();
        assert_eq!(summary, "Key points\n one");
    }

    #[tokio::test]
    async fn test_model_not_found_is_classified() {
        let backend = MockBackend::failing(OllamaError::ModelNotFound("phi3".into()));
        let summarizer = Summarizer::new(backend);
        let message = summarizer.summarize_to_message("text", "phi3", None).await;

        assert!(message.starts_with("Error: Model 'phi3' not found"));
        assert!(message.contains("(http://mock:11434)"));
        assert!(message.ends_with("ollama pull phi3"));
        assert!(is_error_message(&message));
    }

    #[tokio::test]
    async fn test_api_error_mentioning_missing_model_is_classified() {
        let summarizer = Summarizer::new(MockBackend::failing(OllamaError::Api {
            status: Some(400),
            message: "Model Not Found".into(),
        }));
        let err = summarizer.summarize("text", "gemma:2b", None).await.unwrap_err();
        assert!(matches!(
            err,
            SummarizeError::ModelNotFound { ref model, .. } if model == "gemma:2b"
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        let summarizer = Summarizer::new(MockBackend::failing(OllamaError::ConnectionRefused(
            "tcp connect error".into(),
        )));
        let message = summarizer.summarize_to_message("text", "llama3", None).await;

        assert!(message.starts_with("Ollama API Error: Could not connect"));
        assert!(message.ends_with("Details: tcp connect error"));
    }

    #[tokio::test]
    async fn test_service_unavailable_counts_as_refused() {
        let summarizer = Summarizer::new(MockBackend::failing(OllamaError::Api {
            status: Some(503),
            message: "busy".into(),
        }));
        let err = summarizer.summarize("text", "llama3", None).await.unwrap_err();
        assert!(matches!(err, SummarizeError::ConnectionRefused { .. }));
    }

    #[tokio::test]
    async fn test_other_status_is_protocol_error() {
        let summarizer = Summarizer::new(MockBackend::failing(OllamaError::Api {
            status: Some(500),
            message: "llama runner process has terminated".into(),
        }));
        let message = summarizer.summarize_to_message("text", "llama3", None).await;
        assert_eq!(message, "Ollama API Error (500): llama runner process has terminated");

        let err = SummarizeError::from_backend(
            OllamaError::Api {
                status: None,
                message: "odd".into(),
            },
            "llama3",
            "http://h",
        );
        assert_eq!(err.to_string(), "Ollama API Error (N/A): odd");
    }

    #[tokio::test]
    async fn test_transport_and_unexpected_errors() {
        let backend = MockBackend::failing(OllamaError::Transport("timed out".into()));
        let summarizer = Summarizer::new(backend);
        let message = summarizer.summarize_to_message("text", "llama3", None).await;
        assert_eq!(
            message,
            "Ollama Connection Error: Could not connect to Ollama at http://mock:11434. Network issue: timed out"
        );

        let backend = MockBackend::failing(OllamaError::InvalidResponse("missing field".into()));
        let summarizer = Summarizer::new(backend);
        let message = summarizer.summarize_to_message("text", "llama3", None).await;
        assert!(message.starts_with("An unexpected error occurred:"));
    }

    #[tokio::test]
    async fn test_unavailable_client() {
        let summarizer = Summarizer::unavailable("http://nowhere:1");
        assert!(!summarizer.is_available());

        let message = summarizer.summarize_to_message("text", "llama3", None).await;
        assert_eq!(
            message,
            "Ollama client not initialized. Check OLLAMA_HOST (http://nowhere:1) and Ollama service."
        );

        let summarizer = Summarizer::connect("::not a url::");
        assert!(!summarizer.is_available());
        assert_eq!(summarizer.host(), "::not a url::");
    }

    #[tokio::test]
    async fn test_identical_calls_give_identical_results() {
        let summarizer = Summarizer::new(MockBackend::replying("Same *answer*"));
        let first = summarizer.summarize("text", "llama3", Some("p")).await;
        let second = summarizer.summarize("text", "llama3", Some("p")).await;
        assert_eq!(first, second);

        let summarizer = Summarizer::new(MockBackend::failing(OllamaError::Transport("x".into())));
        let first = summarizer.summarize_to_message("text", "llama3", None).await;
        let second = summarizer.summarize_to_message("text", "llama3", None).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_severity() {
        assert!(!SummarizeError::EmptyInput.is_error());
        assert!(SummarizeError::Unexpected("x".into()).is_error());
        assert!(!is_error_message("Input text is empty."));
        assert!(!is_error_message("A fine summary."));
    }
}
