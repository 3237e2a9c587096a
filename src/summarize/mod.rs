use async_trait::async_trait;

pub mod chat;

use crate::sources::Document;
use crate::utils::truncate_chars;
use crate::Result;

pub use chat::ChatCompletionSummarizer;

/// Placeholder replaced by the document text
pub const TEXT_PLACEHOLDER: &str = "{text}";

pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Provide a summary of the following content in about 300 words:\nContent: {text}\n";

/// Secret key for the LLM endpoint, never printed
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Prompt text with exactly one `{text}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let placeholders = template.matches(TEXT_PLACEHOLDER).count();
        if placeholders != 1 {
            anyhow::bail!(
                "Prompt template must contain {} exactly once, found {}",
                TEXT_PLACEHOLDER,
                placeholders
            );
        }

        Ok(Self { template })
    }

    pub fn render(&self, text: &str) -> String {
        self.template.replacen(TEXT_PLACEHOLDER, text, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Produces a natural-language summary of documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        api_key: &ApiKey,
        documents: &[Document],
        prompt: &PromptTemplate,
    ) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Join all documents into a single prompt body ("stuff" strategy)
pub fn stuff_documents(documents: &[Document], max_chars: usize) -> String {
    let joined = documents
        .iter()
        .map(|doc| doc.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let truncated = truncate_chars(&joined, max_chars);
    if truncated.len() < joined.len() {
        tracing::warn!(
            "Content truncated from {} to {} characters before summarizing",
            joined.chars().count(),
            max_chars
        );
    }

    truncated.to_string()
}
