use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::sources::web::WebPageLoader;
use crate::sources::{classify, ContentLoader, Document, SourceKind, TranscriptAcquirer};
use crate::summarize::{ApiKey, ChatCompletionSummarizer, PromptTemplate, Summarizer};
use crate::utils::validate_url;
use crate::SummarizeError;

pub const MISSING_INPUT_MESSAGE: &str = "Please provide both the API key and the URL.";
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL.";

/// The two inputs collected from the user
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub api_key: ApiKey,
    pub url: String,
}

impl SummaryRequest {
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            url: url.into(),
        }
    }
}

/// Summary with details about where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// The generated summary text
    pub summary: String,

    /// URL that was summarized
    pub url: String,

    /// How the URL was classified
    pub source_kind: SourceKind,

    /// Page title, when the loader found one
    pub title: Option<String>,

    /// Model that wrote the summary
    pub model: String,

    /// Characters of source text handed to the summarizer
    pub input_chars: usize,

    /// Timestamp when the summary completed
    pub completed_at: DateTime<Utc>,
}

/// Check both inputs before anything touches the network
pub fn validate_request(request: &SummaryRequest) -> Result<Url, SummarizeError> {
    if request.api_key.is_blank() || request.url.trim().is_empty() {
        return Err(SummarizeError::Input(MISSING_INPUT_MESSAGE.to_string()));
    }

    validate_url(&request.url).map_err(|e| {
        tracing::debug!("URL validation failed: {}", e);
        SummarizeError::Input(INVALID_URL_MESSAGE.to_string())
    })
}

/// Request handler: validate, classify, load, summarize
pub struct SummaryPipeline {
    transcripts: TranscriptAcquirer,
    web_loader: Box<dyn ContentLoader>,
    summarizer: Box<dyn Summarizer>,
    prompt: PromptTemplate,
    model: String,
}

impl SummaryPipeline {
    /// Build the pipeline; the transcript backend is chosen here, once
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let client = config.http_client()?;
        let transcripts = TranscriptAcquirer::from_config(&config.transcripts, client.clone()).await;
        let web_loader = WebPageLoader::new(client.clone());
        let summarizer = ChatCompletionSummarizer::from_config(&config.llm, client);

        Ok(Self::from_parts(
            transcripts,
            Box::new(web_loader),
            Box::new(summarizer),
            config.prompt_template()?,
            config.llm.model.clone(),
        ))
    }

    pub fn from_parts(
        transcripts: TranscriptAcquirer,
        web_loader: Box<dyn ContentLoader>,
        summarizer: Box<dyn Summarizer>,
        prompt: PromptTemplate,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transcripts,
            web_loader,
            summarizer,
            prompt,
            model: model.into(),
        }
    }

    pub fn transcript_backend(&self) -> &'static str {
        self.transcripts.backend_name()
    }

    pub async fn run(&self, request: &SummaryRequest) -> Result<SummaryResult, SummarizeError> {
        let url = validate_request(request)?;
        let raw_url = request.url.trim();

        let source_kind = classify(raw_url);
        tracing::info!("Summarizing {} source: {}", source_kind, raw_url);

        let documents = self.load_documents(source_kind, raw_url, url).await?;
        let input_chars = documents.iter().map(Document::char_count).sum();
        let title = documents.iter().find_map(|doc| doc.metadata.title.clone());

        let summary = self
            .summarizer
            .summarize(&request.api_key, &documents, &self.prompt)
            .await
            .map_err(SummarizeError::Summarization)?;

        Ok(SummaryResult {
            summary,
            url: raw_url.to_string(),
            source_kind,
            title,
            model: self.model.clone(),
            input_chars,
            completed_at: Utc::now(),
        })
    }

    async fn load_documents(
        &self,
        source_kind: SourceKind,
        raw_url: &str,
        url: Url,
    ) -> Result<Vec<Document>, SummarizeError> {
        let documents = match source_kind {
            SourceKind::Video => vec![self
                .transcripts
                .load_transcript(raw_url)
                .await
                .map_err(SummarizeError::Fetch)?],
            SourceKind::Generic => {
                tracing::debug!("Loading page with {} loader", self.web_loader.name());
                self.web_loader
                    .load(&[url])
                    .await
                    .map_err(SummarizeError::Fetch)?
            }
        };

        if documents.iter().all(|doc| doc.text.trim().is_empty()) {
            return Err(SummarizeError::Fetch(anyhow::anyhow!(
                "No text could be extracted from {}",
                raw_url
            )));
        }

        Ok(documents)
    }
}
