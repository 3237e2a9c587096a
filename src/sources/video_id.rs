use once_cell::sync::Lazy;
use regex::Regex;

/// 11 characters of `[0-9A-Za-z_-]` right after `v=` or a `/`
static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11}).*").expect("video id pattern is valid")
});

/// Pull a YouTube video id out of a URL.
///
/// Best effort: when nothing matches, the URL itself is returned unchanged so the
/// transcript fetch can fail later with a proper error.
pub fn extract_video_id(url: &str) -> String {
    VIDEO_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| url.to_string())
}
