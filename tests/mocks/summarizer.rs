use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use url_summarizer::{ApiKey, Document, PromptTemplate, Summarizer};

#[derive(Clone, Default)]
pub struct StubSummarizer {
    pub summary: String,
    /// Rendered prompts, one per call
    pub calls: Arc<Mutex<Vec<String>>>,
    pub keys: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl StubSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(
        &self,
        api_key: &ApiKey,
        documents: &[Document],
        prompt: &PromptTemplate,
    ) -> anyhow::Result<String> {
        let text = documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.calls.lock().unwrap().push(prompt.render(&text));
        self.keys.lock().unwrap().push(api_key.expose().to_string());

        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.summary.clone())
    }

    fn name(&self) -> &'static str {
        "stub-summarizer"
    }
}
