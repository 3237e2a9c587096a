use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use url::Url;
use url_summarizer::sources::{ContentLoader, DocumentMetadata};
use url_summarizer::Document;

#[derive(Clone, Default)]
pub struct StubPageLoader {
    pub text: String,
    pub title: Option<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl StubPageLoader {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

#[async_trait]
impl ContentLoader for StubPageLoader {
    async fn load(&self, urls: &[Url]) -> anyhow::Result<Vec<Document>> {
        let mut documents = Vec::new();
        for url in urls {
            self.calls.lock().unwrap().push(url.to_string());
            documents.push(Document::new(self.text.clone()).with_metadata(DocumentMetadata {
                source: Some(url.to_string()),
                title: self.title.clone(),
                language: None,
            }));
        }
        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "stub-page"
    }
}
