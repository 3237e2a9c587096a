use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::transcript::{language_matches, TranscriptFetcher, TranscriptSegment};
use crate::utils::collapse_whitespace;
use crate::Result;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

/// Caption fetcher that reads YouTube's timedtext tracks over plain HTTP.
///
/// Used when yt-dlp is not installed. The watch page embeds the player response,
/// which lists caption tracks; the chosen track is then requested in `json3` form.
pub struct TimedTextFetcher {
    client: Client,
    languages: Vec<String>,
    watch_url: String,
}

impl TimedTextFetcher {
    pub fn new(client: Client, languages: Vec<String>) -> Self {
        Self {
            client,
            languages,
            watch_url: WATCH_URL.to_string(),
        }
    }

    pub fn with_watch_url(mut self, url: impl Into<String>) -> Self {
        self.watch_url = url.into();
        self
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let watch_url = format!("{}?v={}", self.watch_url, urlencoding::encode(video_id));
        tracing::debug!("Fetching watch page: {}", watch_url);

        let response = self
            .client
            .get(&watch_url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to load watch page: HTTP {}", response.status());
        }

        Ok(response.text().await?)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Json3Transcript> {
        let track_url = json3_url(&track.base_url)?;
        tracing::debug!("Fetching {} caption track", track.language_code);

        let response = self.client.get(track_url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to load caption track: HTTP {}", response.status());
        }

        response
            .json::<Json3Transcript>()
            .await
            .context("Failed to parse caption track")
    }
}

#[async_trait]
impl TranscriptFetcher for TimedTextFetcher {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let html = self.fetch_watch_page(video_id).await?;
        let tracks = parse_caption_tracks(&html)?;

        let track = select_track(&tracks, &self.languages)
            .ok_or_else(|| anyhow::anyhow!("No captions available for video {}", video_id))?;

        let transcript = self.fetch_track(track).await?;
        let segments = transcript.into_segments();
        if segments.is_empty() {
            anyhow::bail!("Caption track for video {} is empty", video_id);
        }

        tracing::info!("Fetched {} transcript segments for {}", segments.len(), video_id);
        Ok(segments)
    }

    fn name(&self) -> &'static str {
        "timedtext"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: TracklistRenderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// One caption track advertised by the player
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,

    /// `"asr"` for automatic speech recognition tracks
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        language_matches(&self.language_code, language)
    }
}

/// Caption tracks listed in a watch page's embedded player response
pub fn parse_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>> {
    let start = html
        .find(PLAYER_RESPONSE_MARKER)
        .map(|index| index + PLAYER_RESPONSE_MARKER.len())
        .context("Watch page does not contain a player response")?;

    // The JSON object is followed by more script, so only the first value is read
    let player: PlayerResponse = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<PlayerResponse>()
        .next()
        .context("Player response is empty")?
        .context("Failed to parse player response")?;

    if let Some(status) = &player.playability_status {
        if status.status != "OK" {
            anyhow::bail!(
                "Video is not playable ({}): {}",
                status.status,
                status.reason.as_deref().unwrap_or("no reason given")
            );
        }
    }

    let tracks = player
        .captions
        .map(|captions| captions.tracklist.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        anyhow::bail!("Video has no captions");
    }

    Ok(tracks)
}

/// Prefer a manual track in the earliest preferred language, then a generated one,
/// then whatever track comes first.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for language in languages {
        let manual = tracks
            .iter()
            .find(|track| !track.is_generated() && track.matches_language(language));
        if manual.is_some() {
            return manual;
        }

        let generated = tracks
            .iter()
            .find(|track| track.is_generated() && track.matches_language(language));
        if generated.is_some() {
            return generated;
        }
    }

    tracks.first()
}

fn json3_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).context("Caption track URL is invalid")?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url)
}

#[derive(Debug, Default, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    t_start_ms: Option<u64>,
    d_duration_ms: Option<u64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

impl Json3Transcript {
    fn into_segments(self) -> Vec<TranscriptSegment> {
        self.events
            .into_iter()
            .filter_map(|event| {
                let raw: String = event.segs?.into_iter().map(|seg| seg.utf8).collect();
                let text = collapse_whitespace(&raw);
                if text.is_empty() {
                    return None;
                }

                Some(TranscriptSegment {
                    text,
                    start: event.t_start_ms.map(|ms| ms as f64 / 1000.0),
                    duration: event.d_duration_ms.map(|ms| ms as f64 / 1000.0),
                })
            })
            .collect()
    }
}
