use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod timedtext;
pub mod transcript;
pub mod video_id;
pub mod web;
pub mod youtube;

use crate::Result;

pub use transcript::{TranscriptAcquirer, TranscriptBackend, TranscriptSegment};
pub use video_id::extract_video_id;

/// Category of content a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Generic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Video => "video",
            SourceKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substrings that mark a URL as a video-hosting link
const VIDEO_HOST_MARKERS: &[&str] = &["youtube.com", "youtu.be"];

/// Classify a URL by substring match.
///
/// This is a heuristic, not a URL grammar check: matching is case-sensitive and a
/// generic URL that merely mentions `youtube.com` (say in a query parameter) is
/// classified as [`SourceKind::Video`].
pub fn classify(url: &str) -> SourceKind {
    if VIDEO_HOST_MARKERS.iter().any(|marker| url.contains(marker)) {
        SourceKind::Video
    } else {
        SourceKind::Generic
    }
}

/// Optional descriptive fields attached to a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// URL the text was loaded from
    pub source: Option<String>,

    /// Page or video title
    pub title: Option<String>,

    /// Language code of a transcript
    pub language: Option<String>,
}

/// A single blob of text handed to the summarizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Loader for generic (non-video) URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentLoader: Send + Sync {
    /// Fetch each URL and extract its readable text, one document per URL
    async fn load(&self, urls: &[Url]) -> Result<Vec<Document>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
