//! Asset reference collection.

use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use url::Url;

use crate::dom::{Element, select_all};
use crate::extract::ContentBlock;
use crate::fetcher::Fetcher;
use crate::text::collapse_whitespace;
use crate::types::FileRole;
use crate::utils::{resolve_url, url_basename};

use super::FileIntent;

/// Image intents for a document, deduplicated by URL
///
/// Image blocks come first, in block order. Any other `img` under `root` whose
/// source the blocks did not cover follows in document order, named from its
/// `title`, `alt`, URL basename or a synthetic `image{N}.jpg`.
pub fn image_intents(
    blocks: &[ContentBlock],
    root: &Element,
    base: Option<&Url>,
) -> Vec<FileIntent> {
    let mut seen = HashSet::new();
    let mut intents = Vec::new();

    for image in blocks.iter().filter_map(ContentBlock::as_image) {
        if seen.insert(image.url.clone()) {
            intents.push(FileIntent::new(&image.url, &image.origin_name, FileRole::Image));
        }
    }

    for img in root.find_all("img") {
        let Some(url) = img.attr("src").and_then(|src| resolve_url(base, src)) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let origin_name = [img.attr("title"), img.attr("alt")]
            .into_iter()
            .flatten()
            .map(collapse_whitespace)
            .find(|name| !name.is_empty())
            .or_else(|| url_basename(&url))
            .unwrap_or_else(|| format!("image{}.jpg", intents.len() + 1));
        intents.push(FileIntent::new(url, origin_name, FileRole::Image));
    }

    intents
}

/// Attachment intents from anchors of the page's file box
///
/// Only anchors whose raw `href` starts with `href_prefix` (when set) count.
/// The origin name is the anchor's trimmed text.
pub fn attachment_intents(
    document: &Html,
    selector: &Selector,
    href_prefix: Option<&str>,
    base: Option<&Url>,
) -> Vec<FileIntent> {
    let mut seen = HashSet::new();
    select_all(document, selector, &[])
        .into_iter()
        .filter_map(|anchor| {
            let href = anchor.attr("href")?.trim();
            if href_prefix.is_some_and(|prefix| !href.starts_with(prefix)) {
                return None;
            }
            let url = resolve_url(base, href)?;
            seen.insert(url.clone())
                .then(|| FileIntent::new(url, collapse_whitespace(&anchor.text()), FileRole::Attachment))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FileApiEntry {
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    file_original_name: Option<String>,
}

/// Parse a file API response (`[{ "file_url", "file_original_name" }]`)
///
/// Entries without a URL are skipped. A missing name falls back to the URL
/// basename.
pub fn parse_file_api(
    body: &str,
    base: Option<&Url>,
) -> std::result::Result<Vec<FileIntent>, serde_json::Error> {
    let entries: Vec<FileApiEntry> = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let url = resolve_url(base, entry.file_url.as_deref()?)?;
            if !seen.insert(url.clone()) {
                return None;
            }
            let origin_name = entry
                .file_original_name
                .map(|n| collapse_whitespace(&n))
                .filter(|n| !n.is_empty())
                .or_else(|| url_basename(&url))
                .unwrap_or_default();
            Some(FileIntent::new(url, origin_name, FileRole::Attachment))
        })
        .collect())
}

/// Attachment intents from a file API endpoint
///
/// A failing or malformed endpoint is logged and yields no attachments; it
/// never fails the document.
pub async fn file_api_intents(fetcher: &dyn Fetcher, url: &str, base: Option<&Url>) -> Vec<FileIntent> {
    let body = match fetcher.fetch_page(url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url, error = %e, "file api request failed, continuing without attachments");
            return Vec::new();
        }
    };
    match parse_file_api(&body, base) {
        Ok(intents) => intents,
        Err(e) => {
            tracing::warn!(url, error = %e, "file api returned malformed JSON, continuing without attachments");
            Vec::new()
        }
    }
}
