//! Guide-page crawling.
//!
//! Guide pages (curriculum, scholarships, calendars) are organized by headings
//! rather than free-form paragraphs. Each one is written as a standalone HTML
//! page plus the heading-indexed section map.

use scraper::Html;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::GuidePage;
use crate::dom::{Element, parse_selector};
use crate::error::{Error, PersistenceError, Result};
use crate::extract::{IndexedMap, Section, parse_sections};
use crate::retry::with_retry;
use crate::text::{ExcludeTerms, collapse_whitespace};
use crate::types::Event;

use super::Materializer;
use super::pipeline::write_artifact;

/// Files written for one guide page
#[derive(Clone, Debug)]
pub struct GuideArtifacts {
    /// Guide page key
    pub key: String,
    /// `<key>.html`
    pub html_path: PathBuf,
    /// `<key>.json`
    pub json_path: PathBuf,
    /// The section map written to `json_path`
    pub sections: IndexedMap<Section>,
}

/// Result of crawling one guide page within a batch
#[derive(Clone, Debug)]
pub enum GuideOutcome {
    /// Page written
    Crawled(GuideArtifacts),
    /// Page failed; an error file was written
    Failed {
        /// Guide page key
        key: String,
        /// Error message
        error: String,
    },
}

impl GuideOutcome {
    /// Key of the page this outcome is for
    pub fn key(&self) -> &str {
        match self {
            GuideOutcome::Crawled(artifacts) => &artifacts.key,
            GuideOutcome::Failed { key, .. } => key,
        }
    }

    /// True if the page was written
    pub fn is_success(&self) -> bool {
        matches!(self, GuideOutcome::Crawled(_))
    }
}

/// Counts for a batch of guide pages
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GuideStats {
    /// Pages attempted
    pub total: usize,
    /// Pages written
    pub succeeded: usize,
    /// Pages that failed
    pub failed: usize,
    /// Percentage of pages written (0 when nothing was attempted)
    pub success_rate: f64,
}

#[derive(Serialize)]
struct GuideErrorReport<'a> {
    key: &'a str,
    name: &'a str,
    url: &'a str,
    error: bool,
    message: String,
    timestamp: String,
}

impl Materializer {
    /// Crawl one configured guide page
    ///
    /// The page fetch is retried on transient failures. A page without the
    /// configured content element (or with an empty one) fails with
    /// [`Error::ContentNotFound`].
    pub async fn crawl_guide(&self, key: &str) -> Result<GuideArtifacts> {
        let page = self
            .config
            .guide(key)
            .ok_or_else(|| Error::NotFound(format!("guide page '{}' is not configured", key)))?;
        let guides = &self.config.guides;

        tracing::info!(key, url = %page.url, "Crawling guide page");

        let body = with_retry(&guides.retry, || self.fetcher.fetch_page(&page.url)).await?;
        let (content, sections) = parse_guide(page, &body, &guides.content_selector)?;

        tokio::fs::create_dir_all(&guides.output_dir)
            .await
            .map_err(|e| PersistenceError::WriteFailed {
                path: guides.output_dir.clone(),
                reason: e.to_string(),
            })?;

        let html_path = guides.output_dir.join(format!("{}.html", key));
        let title = format!("{} {}", guides.title_prefix, page.name);
        write_artifact(&html_path, render_guide_html(&title, &content)).await?;

        let json_path = guides.output_dir.join(format!("{}.json", key));
        write_artifact(&json_path, serde_json::to_string_pretty(&sections)?).await?;

        tracing::info!(key, sections = sections.len(), "Guide page written");
        self.emit(Event::GuideCrawled {
            key: key.to_string(),
            sections: sections.len(),
        });

        Ok(GuideArtifacts {
            key: key.to_string(),
            html_path,
            json_path,
            sections,
        })
    }

    /// Crawl several guide pages in order, continuing past failures
    ///
    /// Every failure leaves a `<key>_error.json` next to the outputs.
    pub async fn crawl_guides(&self, keys: &[&str]) -> (Vec<GuideOutcome>, GuideStats) {
        let mut outcomes = Vec::with_capacity(keys.len());

        for &key in keys {
            match self.crawl_guide(key).await {
                Ok(artifacts) => outcomes.push(GuideOutcome::Crawled(artifacts)),
                Err(e) => {
                    tracing::error!(key, code = e.code(), error = %e, "Guide page failed");
                    self.write_error_report(key, &e).await;
                    self.emit(Event::GuideFailed {
                        key: key.to_string(),
                        error: e.to_string(),
                    });
                    outcomes.push(GuideOutcome::Failed {
                        key: key.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let stats = GuideStats {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            success_rate: if outcomes.is_empty() {
                0.0
            } else {
                succeeded as f64 * 100.0 / outcomes.len() as f64
            },
        };
        tracing::info!(
            total = stats.total,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Guide crawl finished"
        );

        (outcomes, stats)
    }

    /// Crawl every configured guide page
    pub async fn crawl_all_guides(&self) -> (Vec<GuideOutcome>, GuideStats) {
        let keys: Vec<&str> = self
            .config
            .guides
            .pages
            .iter()
            .map(|p| p.key.as_str())
            .collect();
        self.crawl_guides(&keys).await
    }

    async fn write_error_report(&self, key: &str, error: &Error) {
        let output_dir = &self.config.guides.output_dir;
        let page = self.config.guide(key);
        let report = GuideErrorReport {
            key,
            name: page.map(|p| p.name.as_str()).unwrap_or_default(),
            url: page.map(|p| p.url.as_str()).unwrap_or_default(),
            error: true,
            message: error.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let path = output_dir.join(format!("{}_error.json", key));
        let result = match serde_json::to_string_pretty(&report) {
            Ok(json) => match tokio::fs::create_dir_all(output_dir).await {
                Ok(()) => write_artifact(&path, json).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(key, path = %path.display(), error = %e, "Failed to write guide error report");
        }
    }
}

/// Select the guide body and build its section map
fn parse_guide(
    page: &GuidePage,
    body: &str,
    content_selector: &str,
) -> Result<(String, IndexedMap<Section>)> {
    let document = Html::parse_document(body);
    let selector = parse_selector(content_selector)?;

    let content = document
        .select(&selector)
        .next()
        .map(|el| Element::from_element_ref(el, &[]))
        .filter(|el| !collapse_whitespace(&el.text()).is_empty())
        .ok_or_else(|| Error::ContentNotFound {
            document_id: page.key.clone(),
            selectors: vec![content_selector.to_string()],
        })?;

    let sections = parse_sections(&content, &ExcludeTerms::new(&page.exclude_terms));
    Ok((content.inner_html(), sections))
}

fn render_guide_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{}</title>
</head>
<body>
  <div class="sub-step">
{}
  </div>
</body>
</html>
"#,
        escape_text(title),
        content
    )
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
