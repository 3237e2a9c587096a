use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use super::transcript::{language_matches, TranscriptLoader};
use super::{Document, DocumentMetadata};
use crate::utils::collapse_whitespace;
use crate::Result;

static CUE_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("cue tag pattern is valid"));

/// YouTube caption loader using yt-dlp
pub struct YtDlpTranscriptLoader {
    yt_dlp_path: String,
    languages: Vec<String>,
}

impl YtDlpTranscriptLoader {
    pub fn new(yt_dlp_path: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            languages,
        }
    }

    fn preferred_languages(&self) -> Vec<String> {
        if self.languages.is_empty() {
            vec!["en".to_string()]
        } else {
            self.languages.clone()
        }
    }

    /// `--sub-langs` value accepting each language and its regional variants
    fn sub_langs(&self) -> String {
        self.preferred_languages()
            .iter()
            .map(|language| format!("{},{}-.*", language, regex::escape(language)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Write the caption files for `url` into `output_dir` without downloading media
    async fn download_captions(&self, url: &str, output_dir: &Path) -> Result<()> {
        tracing::debug!("Downloading captions for: {}", url);

        let output_template = output_dir.join("%(id)s.%(ext)s");
        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--skip-download",
                // Manual subtitles first, automatic ones when that is all there is
                "--write-sub",
                "--write-auto-sub",
                "--sub-lang",
                &self.sub_langs(),
                "--sub-format",
                "vtt",
                "--no-playlist",
                "--no-warnings",
                "--output",
                &output_template.to_string_lossy(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        Ok(())
    }
}

#[async_trait]
impl TranscriptLoader for YtDlpTranscriptLoader {
    async fn load(&self, url: &str) -> Result<Vec<Document>> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        self.download_captions(url, temp_dir.path()).await?;

        let mut caption_files: Vec<PathBuf> = fs_err::read_dir(temp_dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("vtt"))
            .collect();
        caption_files.sort();

        let path = select_caption_file(&caption_files, &self.preferred_languages())
            .with_context(|| format!("No captions available for {}", url))?;

        let content = fs_err::read_to_string(path)?;
        let text = vtt_to_text(&content);
        if text.is_empty() {
            anyhow::bail!("Caption file {} contained no cue text", path.display());
        }

        let language = caption_language(path);
        tracing::info!(
            "Loaded {} captions with yt-dlp",
            language.as_deref().unwrap_or("unknown")
        );

        Ok(vec![Document::new(text).with_metadata(DocumentMetadata {
            source: Some(url.to_string()),
            title: None,
            language,
        })])
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Language code from a yt-dlp caption file name such as `dQw4w9WgXcQ.en.vtt`
fn caption_language(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, language) = stem.rsplit_once('.')?;
    Some(language.to_string())
}

/// The caption file for the earliest preferred language, or the first one written
fn select_caption_file<'a>(files: &'a [PathBuf], languages: &[String]) -> Option<&'a PathBuf> {
    languages
        .iter()
        .find_map(|language| {
            files.iter().find(|path| {
                caption_language(path).is_some_and(|code| language_matches(&code, language))
            })
        })
        .or_else(|| files.first())
}

/// Reduce a WebVTT caption file to its spoken text.
///
/// Timing lines, headers, cue ids and inline tags are dropped. YouTube's automatic
/// captions repeat each line while it scrolls, so consecutive duplicates are skipped.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_note = false;

    for raw in vtt.lines() {
        let line = raw.trim();
        if line.is_empty() {
            in_note = false;
            continue;
        }
        if in_note {
            continue;
        }
        if line.starts_with("NOTE") || line.starts_with("STYLE") {
            in_note = true;
            continue;
        }
        if line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.contains("-->")
            || line.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }

        let cleaned = collapse_whitespace(&decode_entities(&CUE_TAG_REGEX.replace_all(line, "")));
        if cleaned.is_empty() || lines.last() == Some(&cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
