//! URL Summarizer - A Rust CLI tool for summarizing YouTube videos and web pages
//!
//! This library classifies a URL as a video or a generic website, obtains its text
//! (a caption transcript or the readable page content) and asks a hosted LLM for a
//! short summary through an OpenAI-compatible chat completions endpoint.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod summarize;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use pipeline::{SummaryPipeline, SummaryRequest, SummaryResult};
pub use sources::{classify, Document, SourceKind};
pub use summarize::{ApiKey, PromptTemplate, Summarizer};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Message shown for any failure after input validation passed
pub const GENERIC_FAILURE_MESSAGE: &str = "Error occurred. Please check the link or API key.";

/// Error kinds surfaced to the person running a summary request
#[derive(thiserror::Error, Debug)]
pub enum SummarizeError {
    #[error("{0}")]
    Input(String),

    #[error("Content loading failed")]
    Fetch(#[source] anyhow::Error),

    #[error("Summarization failed")]
    Summarization(#[source] anyhow::Error),
}

impl SummarizeError {
    /// Message suitable for display; fetch and summarization failures share one
    pub fn user_message(&self) -> &str {
        match self {
            SummarizeError::Input(message) => message,
            SummarizeError::Fetch(_) | SummarizeError::Summarization(_) => GENERIC_FAILURE_MESSAGE,
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, SummarizeError::Input(_))
    }
}
