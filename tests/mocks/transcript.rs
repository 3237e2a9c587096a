use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use url_summarizer::sources::transcript::{TranscriptFetcher, TranscriptLoader, TranscriptSegment};
use url_summarizer::Document;

#[derive(Clone, Default)]
pub struct StubFetcher {
    pub segments: Vec<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl StubFetcher {
    pub fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
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
impl TranscriptFetcher for StubFetcher {
    async fn fetch(&self, video_id: &str) -> anyhow::Result<Vec<TranscriptSegment>> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.segments.iter().map(TranscriptSegment::new).collect())
    }

    fn name(&self) -> &'static str {
        "stub-fetcher"
    }
}

#[derive(Clone, Default)]
pub struct StubLoader {
    pub documents: Vec<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl StubLoader {
    pub fn new(documents: &[&str]) -> Self {
        Self {
            documents: documents.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TranscriptLoader for StubLoader {
    async fn load(&self, url: &str) -> anyhow::Result<Vec<Document>> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.documents.iter().map(Document::new).collect())
    }

    fn name(&self) -> &'static str {
        "stub-loader"
    }
}
