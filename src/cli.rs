use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

#[derive(Parser, Debug)]
#[command(
    name = "summarizer",
    version,
    about = "Summarize text using local Ollama models",
    long_about = None
)]
pub struct Cli {
    /// Base URL of the Ollama server (overrides OLLAMA_HOST)
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub host: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize text from an argument, a file, or stdin
    Summarize(SummarizeOptions),
    /// List suggested and installed models
    Models,
    /// Check whether the Ollama server is reachable
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeOptions {
    /// Text to summarize
    #[arg(short, long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the text from a UTF-8 .txt file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Model to use (defaults to OLLAMA_MODEL, then llama3)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Custom prompt template; `{text_to_summarize}` marks where the text goes
    /// and `{{` / `}}` produce literal braces
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Save the summary as markdown to this file or directory
    #[arg(short, long, value_hint = ValueHint::AnyPath)]
    pub output: Option<PathBuf>,
}
