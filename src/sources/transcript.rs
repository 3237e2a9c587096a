use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::timedtext::TimedTextFetcher;
use super::video_id::extract_video_id;
use super::youtube::YtDlpTranscriptLoader;
use super::Document;
use crate::config::TranscriptsConfig;
use crate::utils::check_command_available;
use crate::Result;

/// One caption fragment, in the order it appears in the video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,

    /// Start time in seconds, when the backend reports it
    pub start: Option<f64>,

    /// Duration in seconds, when the backend reports it
    pub duration: Option<f64>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            duration: None,
        }
    }
}

/// Primary mechanism: turns a raw video URL into transcript documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<Document>>;

    fn name(&self) -> &'static str;
}

/// Fallback mechanism: fetches caption segments for a video id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;

    fn name(&self) -> &'static str;
}

/// Which transcript mechanism to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptBackend {
    /// Use yt-dlp when it is installed, otherwise the timedtext fetcher
    #[default]
    Auto,
    YtDlp,
    Timedtext,
}

impl TranscriptBackend {
    /// Resolve `Auto` into a concrete backend by probing for yt-dlp
    pub async fn detect(self, yt_dlp_path: &str) -> TranscriptBackend {
        match self {
            TranscriptBackend::Auto => {
                if check_command_available(yt_dlp_path).await {
                    TranscriptBackend::YtDlp
                } else {
                    tracing::info!("{} not found, using timedtext transcript fallback", yt_dlp_path);
                    TranscriptBackend::Timedtext
                }
            }
            concrete => concrete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptBackend::Auto => "auto",
            TranscriptBackend::YtDlp => "yt-dlp",
            TranscriptBackend::Timedtext => "timedtext",
        }
    }
}

impl std::fmt::Display for TranscriptBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a video URL into a single transcript document.
///
/// The mechanism is fixed when the acquirer is built and never re-evaluated.
pub enum TranscriptAcquirer {
    Loader(Box<dyn TranscriptLoader>),
    Fetcher(Box<dyn TranscriptFetcher>),
}

impl TranscriptAcquirer {
    /// Pick the mechanism once, based on configuration and what is installed
    pub async fn from_config(config: &TranscriptsConfig, client: reqwest::Client) -> Self {
        let backend = config.backend.detect(&config.yt_dlp_path).await;
        tracing::debug!("Transcript backend resolved to {}", backend);

        match backend {
            TranscriptBackend::YtDlp => Self::Loader(Box::new(YtDlpTranscriptLoader::new(
                config.yt_dlp_path.clone(),
                config.languages.clone(),
            ))),
            _ => Self::Fetcher(Box::new(TimedTextFetcher::new(client, config.languages.clone()))),
        }
    }

    /// Name of the mechanism in use
    pub fn backend_name(&self) -> &'static str {
        match self {
            TranscriptAcquirer::Loader(loader) => loader.name(),
            TranscriptAcquirer::Fetcher(fetcher) => fetcher.name(),
        }
    }

    pub async fn load_transcript(&self, url: &str) -> Result<Document> {
        match self {
            TranscriptAcquirer::Loader(loader) => {
                let documents = loader.load(url).await?;
                merge_documents(documents)
            }
            TranscriptAcquirer::Fetcher(fetcher) => {
                let video_id = extract_video_id(url);
                tracing::debug!("Fetching transcript segments for video id {}", video_id);

                let segments = fetcher.fetch(&video_id).await?;
                Ok(Document::new(join_segments(&segments)))
            }
        }
    }
}

/// Whether a caption language code such as `en-GB` satisfies a preferred `en`
pub(crate) fn language_matches(code: &str, language: &str) -> bool {
    code == language
        || code
            .strip_prefix(language)
            .is_some_and(|rest| rest.starts_with('-'))
}

/// Join segment texts with a single space
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenate every loader document into one, keeping the first one's metadata
fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    let mut documents = documents.into_iter();
    let Some(first) = documents.next() else {
        anyhow::bail!("Transcript loader returned no documents");
    };

    let mut merged = first;
    for document in documents {
        merged.text.push(' ');
        merged.text.push_str(&document.text);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::DocumentMetadata;

    #[tokio::test]
    async fn test_fallback_joins_segments_with_single_space() {
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|video_id| video_id == "dQw4w9WgXcQ")
            .times(1)
            .returning(|_| Ok(vec![TranscriptSegment::new("Hello"), TranscriptSegment::new("world")]));

        let acquirer = TranscriptAcquirer::Fetcher(Box::new(fetcher));
        let doc = acquirer
            .load_transcript("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap();

        assert_eq!(doc.text, "Hello world");
        assert_eq!(doc.metadata, DocumentMetadata::default());
    }

    #[tokio::test]
    async fn test_fallback_passes_raw_url_when_no_id_found() {
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|video_id| video_id == "https://youtube.com/x")
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("video unavailable")));

        let acquirer = TranscriptAcquirer::Fetcher(Box::new(fetcher));
        let err = acquirer.load_transcript("https://youtube.com/x").await.unwrap_err();
        assert!(err.to_string().contains("video unavailable"));
    }

    #[tokio::test]
    async fn test_loader_documents_are_concatenated() {
        let mut loader = MockTranscriptLoader::new();
        loader.expect_load().times(1).returning(|url| {
            let metadata = DocumentMetadata {
                source: Some(url.to_string()),
                title: None,
                language: Some("en".to_string()),
            };
            Ok(vec![
                Document::new("first part").with_metadata(metadata),
                Document::new("second part"),
            ])
        });

        let acquirer = TranscriptAcquirer::Loader(Box::new(loader));
        let doc = acquirer.load_transcript("https://youtu.be/dQw4w9WgXcQ").await.unwrap();

        assert_eq!(doc.text, "first part second part");
        assert_eq!(doc.metadata.language.as_deref(), Some("en"));
        assert_eq!(doc.metadata.source.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_loader_with_no_documents_fails() {
        let mut loader = MockTranscriptLoader::new();
        loader.expect_load().returning(|_| Ok(Vec::new()));

        let acquirer = TranscriptAcquirer::Loader(Box::new(loader));
        assert!(acquirer.load_transcript("https://youtu.be/dQw4w9WgXcQ").await.is_err());
    }

    #[test]
    fn test_backend_names() {
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_name().return_const("timedtext");
        let acquirer = TranscriptAcquirer::Fetcher(Box::new(fetcher));
        assert_eq!(acquirer.backend_name(), "timedtext");
    }

    #[test]
    fn test_concrete_backends_skip_detection() {
        let backend = tokio_test::block_on(TranscriptBackend::Timedtext.detect("definitely-not-installed"));
        assert_eq!(backend, TranscriptBackend::Timedtext);

        let backend = tokio_test::block_on(TranscriptBackend::YtDlp.detect("definitely-not-installed"));
        assert_eq!(backend, TranscriptBackend::YtDlp);
    }

    #[tokio::test]
    async fn test_auto_falls_back_without_binary() {
        let backend = TranscriptBackend::Auto
            .detect("url-summarizer-missing-binary-for-tests")
            .await;
        assert_eq!(backend, TranscriptBackend::Timedtext);
    }

    #[test]
    fn test_language_matches_regional_variants() {
        assert!(language_matches("en", "en"));
        assert!(language_matches("en-GB", "en"));
        assert!(!language_matches("eng", "en"));
        assert!(!language_matches("en", "en-GB"));
    }

    #[test]
    fn test_backend_serde_names() {
        let backend: TranscriptBackend = serde_yaml::from_str("yt-dlp").unwrap();
        assert_eq!(backend, TranscriptBackend::YtDlp);
        assert_eq!(serde_yaml::to_string(&TranscriptBackend::Timedtext).unwrap().trim(), "timedtext");
    }
}
