use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::{ContentLoader, Document, DocumentMetadata};
use crate::utils::collapse_whitespace;
use crate::Result;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector is valid"));

/// Elements whose text never counts as readable content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Generic web page loader
pub struct WebPageLoader {
    client: Client,
}

impl WebPageLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn load_one(&self, url: &Url) -> Result<Document> {
        tracing::debug!("Fetching page: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_lowercase());

        if let Some(ct) = content_type.as_deref() {
            if !ct.contains("html") && !is_textual(ct) {
                anyhow::bail!("Unsupported content type {} at {}", ct, url);
            }
        }

        let body = response.text().await?;

        let (title, text) = if is_html(content_type.as_deref(), &body) {
            extract_readable_text(&body)
        } else {
            (None, collapse_whitespace(&body))
        };

        if text.is_empty() {
            anyhow::bail!("No readable text found at {}", url);
        }

        tracing::info!("Extracted {} characters from {}", text.chars().count(), url);

        Ok(Document::new(text).with_metadata(DocumentMetadata {
            source: Some(url.to_string()),
            title,
            language: None,
        }))
    }
}

#[async_trait]
impl ContentLoader for WebPageLoader {
    async fn load(&self, urls: &[Url]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(urls.len());
        for url in urls {
            documents.push(self.load_one(url).await?);
        }
        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "web page"
    }
}

fn is_html(content_type: Option<&str>, body: &str) -> bool {
    match content_type {
        Some(ct) => ct.contains("html"),
        None => body.trim_start().starts_with('<'),
    }
}

/// `text/*` and the JSON/XML types that read as text
fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/") || content_type.contains("json") || content_type.contains("xml")
}

/// Page title and the visible text of the body
pub fn extract_readable_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty());

    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    (title, collapse_whitespace(&parts.join(" ")))
}
