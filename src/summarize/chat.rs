use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{stuff_documents, ApiKey, PromptTemplate, Summarizer};
use crate::config::LlmConfig;
use crate::sources::Document;
use crate::Result;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Completion returned no content")]
    EmptyResponse,
    #[error("Nothing to summarize")]
    EmptyInput,
}

/// Summarizer backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionSummarizer {
    client: Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_input_chars: usize,
}

impl ChatCompletionSummarizer {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client,
            base_url: defaults.base_url,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            max_input_chars: defaults.max_input_chars,
        }
    }

    pub fn from_config(config: &LlmConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, user_content: String) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: user_content,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub async fn send_completion_request(
        &self,
        api_key: &ApiKey,
        user_content: String,
    ) -> std::result::Result<String, ChatError> {
        let body = self.request_body(user_content);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status,
                message: api_error_message(&text),
            });
        }

        let response = resp.json::<CompletionResponse>().await?;
        response.into_content()
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    async fn summarize(
        &self,
        api_key: &ApiKey,
        documents: &[Document],
        prompt: &PromptTemplate,
    ) -> Result<String> {
        let content = stuff_documents(documents, self.max_input_chars);
        if content.is_empty() {
            return Err(ChatError::EmptyInput.into());
        }

        tracing::info!(
            "Requesting summary from {} ({} characters of content)",
            self.model,
            content.chars().count()
        );

        let summary = self
            .send_completion_request(api_key, prompt.render(&content))
            .await?;

        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl CompletionResponse {
    fn into_content(self) -> std::result::Result<String, ChatError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// The `error.message` field of an API error body, or the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::serve_once;

    #[test]
    fn test_request_body_shape() {
        let mut config = LlmConfig::default();
        config.temperature = Some(0.2);
        let summarizer = ChatCompletionSummarizer::from_config(&config, Client::new());

        let body = serde_json::to_value(summarizer.request_body("hello".to_string())).unwrap();
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_completion_content_is_extracted() {
        let json = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"  A short summary.  "},"finish_reason":"stop"}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_content().unwrap(), "A short summary.");
    }

    #[test]
    fn test_empty_completion_is_an_error() {
        let json = r#"{"id":"chatcmpl-2","choices":[]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_content(), Err(ChatError::EmptyResponse)));

        let json = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null}}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_content(), Err(ChatError::EmptyResponse)));
    }

    #[test]
    fn test_api_error_message_parsing() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(api_error_message(body), "Invalid API Key");
        assert_eq!(api_error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let summarizer = ChatCompletionSummarizer::new(Client::new(), "m").with_base_url("http://localhost:9000/v1/");
        assert_eq!(summarizer.base_url, "http://localhost:9000/v1");
        assert_eq!(summarizer.model(), "m");
    }

    #[tokio::test]
    async fn test_unauthorized_response_becomes_api_error() {
        let body = br#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let base = serve_once("401 Unauthorized", "application/json", body).await;
        let summarizer = ChatCompletionSummarizer::new(Client::new(), "m").with_base_url(base);

        let err = summarizer
            .send_completion_request(&ApiKey::new("bad_key"), "hello".to_string())
            .await
            .unwrap_err();

        match err {
            ChatError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_summarize_against_endpoint() {
        let body = br#"{"id":"chatcmpl-3","choices":[{"index":0,"message":{"role":"assistant","content":"Rust is fast."},"finish_reason":"stop"}]}"#;
        let base = serve_once("200 OK", "application/json", body).await;
        let summarizer = ChatCompletionSummarizer::new(Client::new(), "m").with_base_url(format!("{}/v1/", base));

        let summary = summarizer
            .summarize(
                &ApiKey::new("gsk_key"),
                &[Document::new("Rust is a systems language.")],
                &PromptTemplate::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary, "Rust is fast.");
    }

    #[tokio::test]
    async fn test_empty_documents_fail_without_request() {
        let summarizer = ChatCompletionSummarizer::new(Client::new(), "m").with_base_url("http://127.0.0.1:9");
        let err = summarizer
            .summarize(&ApiKey::new("k"), &[Document::new("   ")], &PromptTemplate::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nothing to summarize"));
    }
}
