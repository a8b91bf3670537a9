pub mod ollama;
pub mod prompts;
pub mod summarizer;

pub use ollama::{
    ChatBackend, ChatMessage, ChatRequest, ChatResponse, OllamaClient, OllamaError, OllamaModel,
};
pub use prompts::{PromptTemplate, SummaryPrompts};
pub use summarizer::{SummarizeError, Summarizer, is_error_message};
