//! Single-document materialization.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::assets::{
    AssetDownloader, AssetEntry, AttachmentEntry, DownloadOutcome, FileIntent, ReusableAsset,
    apply_to_blocks, asset_entries, attachment_entries, attachment_intents, file_api_intents,
    image_intents, rewrite_image_sources,
};
use crate::config::{AttachmentSource, SourceConfig};
use crate::db::NewAssetRecord;
use crate::dom::{Element, locate_content_root, parse_selector, parse_selectors};
use crate::error::{Error, FetchError, PersistenceError, Result};
use crate::extract::{BlockExtractor, ContentBlock};
use crate::types::{DocumentId, Event};
use crate::utils::to_url_path;

use super::Materializer;

/// The `<id>_detail.json` document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDetail {
    /// Document ID
    pub id: DocumentId,
    /// Page the content was taken from
    pub source_url: String,
    /// Forward-slash path of the rewritten HTML
    pub html: String,
    /// Extracted blocks with image paths filled in
    pub content: Vec<ContentBlock>,
    /// Stored images
    pub assets: Vec<AssetEntry>,
    /// Every attachment, stored or not
    pub attachments: Vec<AttachmentEntry>,
}

/// What a call to [`Materializer::materialize`] produced
#[derive(Clone, Debug)]
pub struct MaterializationResult {
    /// Document ID
    pub document_id: DocumentId,
    /// The detail as written to (or read back from) disk
    pub detail: DocumentDetail,
    /// True if the stored detail was returned without running the pipeline
    pub reused: bool,
    /// Assets fetched during this call
    pub downloaded: usize,
    /// Assets kept from an earlier run
    pub kept: usize,
    /// Assets that failed during this call
    pub failed: usize,
}

/// Everything the pipeline needs from the parsed page
///
/// Built synchronously so the parsed `Html` never lives across an await.
struct PreparedDocument {
    root: Element,
    blocks: Vec<ContentBlock>,
    images: Vec<FileIntent>,
    attachments: Vec<FileIntent>,
}

impl Materializer {
    /// Materialize one document
    ///
    /// A settled document (complete, and without failed assets when partial
    /// documents are retried) whose detail JSON is still on disk is returned
    /// as stored unless `force` is set. Otherwise the full pipeline runs.
    ///
    /// Document-level failures are recorded on the document's status before
    /// being returned; per-asset failures are not errors.
    pub async fn materialize(&self, id: DocumentId, force: bool) -> Result<MaterializationResult> {
        if !force && let Some(result) = self.read_through(id).await? {
            return Ok(result);
        }

        match self.run_pipeline(id, force).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(document_id = id.0, code = e.code(), error = %e, "Materialization failed");
                if let Err(db_err) = self.db.mark_failed(id, &e.to_string()).await {
                    tracing::error!(document_id = id.0, error = %db_err, "Failed to record document failure");
                }
                self.emit(Event::MaterializationFailed {
                    id,
                    code: e.code().to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Path of a document's detail JSON
    pub fn detail_path(&self, id: DocumentId) -> PathBuf {
        self.config
            .source
            .document_dir(id)
            .join(format!("{}_detail.json", id))
    }

    /// Path of a document's rewritten HTML
    pub fn html_path(&self, id: DocumentId) -> PathBuf {
        self.config.source.document_dir(id).join(format!("{}.html", id))
    }

    async fn read_through(&self, id: DocumentId) -> Result<Option<MaterializationResult>> {
        let Some(status) = self.db.get_status(id).await? else {
            return Ok(None);
        };
        if !status.is_settled(self.config.download.retry_partial_documents) {
            return Ok(None);
        }

        let path = self.detail_path(id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(document_id = id.0, path = %path.display(), "Completed document has no detail file, materializing again");
                return Ok(None);
            }
            Err(e) => {
                return Err(PersistenceError::ReadFailed {
                    path,
                    reason: e.to_string(),
                }
                .into());
            }
        };
        let detail: DocumentDetail = match serde_json::from_str(&raw) {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(document_id = id.0, path = %path.display(), error = %e, "Stored detail is unreadable, materializing again");
                return Ok(None);
            }
        };

        tracing::debug!(document_id = id.0, "Document already complete, returning stored detail");
        self.emit(Event::MaterializationReused { id });

        Ok(Some(MaterializationResult {
            document_id: id,
            detail,
            reused: true,
            downloaded: 0,
            kept: 0,
            failed: 0,
        }))
    }

    /// Registered URL, else the configured template
    async fn source_url(&self, id: DocumentId) -> Result<String> {
        if let Some(document) = self.db.get_document(id).await? {
            return Ok(document.source_url);
        }
        self.config.source.page_url(id).ok_or_else(|| {
            Error::NotFound(format!(
                "document {} is not registered and no url template is configured",
                id
            ))
        })
    }

    async fn run_pipeline(&self, id: DocumentId, force: bool) -> Result<MaterializationResult> {
        let url = self.source_url(id).await?;
        self.db.mark_in_progress(id).await?;

        tracing::info!(document_id = id.0, url = %url, force, "Materializing document");
        self.emit(Event::MaterializationStarted {
            id,
            url: url.clone(),
        });

        let base = Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let page = self.fetcher.fetch_page(&url).await?;
        let PreparedDocument {
            mut root,
            mut blocks,
            images,
            mut attachments,
        } = prepare_document(id, &page, &base, &self.config.source)?;

        if let AttachmentSource::FileApi { url_template } = &self.config.source.attachments {
            let api_url = url_template.replace("{id}", &id.to_string());
            attachments = file_api_intents(self.fetcher.as_ref(), &api_url, Some(&base)).await;
        }
        let intents: Vec<FileIntent> = images.into_iter().chain(attachments).collect();

        let dir = self.config.source.document_dir(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistenceError::WriteFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;

        let reusable = if force {
            HashMap::new()
        } else {
            self.reusable_assets(id).await?
        };
        let outcomes = AssetDownloader::new(
            self.fetcher.as_ref(),
            &dir,
            self.config.download.max_concurrent_assets,
        )
        .with_reusable(reusable)
        .download_all(intents.clone())
        .await;

        let (mut downloaded, mut kept, mut failed) = (0, 0, 0);
        for outcome in &outcomes {
            match outcome {
                DownloadOutcome::Success(stored) if stored.reused => kept += 1,
                DownloadOutcome::Success(stored) => {
                    downloaded += 1;
                    self.emit(Event::AssetDownloaded {
                        id,
                        role: stored.intent.role,
                        file_name: stored.file_name.clone(),
                    });
                }
                DownloadOutcome::Failure { intent, error } => {
                    failed += 1;
                    tracing::warn!(document_id = id.0, url = %intent.url, role = %intent.role, error = %error, "Asset download failed");
                    self.emit(Event::AssetFailed {
                        id,
                        url: intent.url.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        apply_to_blocks(&mut blocks, &outcomes);
        rewrite_image_sources(&mut root, Some(&base), &outcomes);

        // Phase 1: artifacts on disk
        let html_path = self.html_path(id);
        write_artifact(&html_path, root.inner_html()).await?;

        let detail = DocumentDetail {
            id,
            source_url: url,
            html: to_url_path(&html_path),
            content: blocks,
            assets: asset_entries(&outcomes),
            attachments: attachment_entries(&intents, &outcomes),
        };
        write_artifact(&self.detail_path(id), serde_json::to_string_pretty(&detail)?).await?;

        // Phase 2: asset records and completion, atomically
        let records: Vec<NewAssetRecord> = outcomes
            .iter()
            .filter_map(DownloadOutcome::stored)
            .map(|stored| NewAssetRecord {
                role: stored.intent.role,
                file_name: stored.file_name.clone(),
                origin_name: stored.intent.origin_name.clone(),
                file_path: stored.local_path.clone(),
                source_url: stored.intent.url.clone(),
                sha256: stored.sha256.clone(),
            })
            .collect();
        let last_error = (failed > 0).then(|| format!("{} asset(s) failed", failed));
        self.db
            .commit_document(id, &records, failed, last_error.as_deref())
            .await
            .map_err(|e| PersistenceError::Commit {
                document_id: id,
                reason: e.to_string(),
            })?;

        tracing::info!(
            document_id = id.0,
            blocks = detail.content.len(),
            downloaded,
            kept,
            failed,
            "Document materialized"
        );
        self.emit(Event::MaterializationComplete {
            id,
            assets_stored: records.len(),
            assets_failed: failed,
        });

        Ok(MaterializationResult {
            document_id: id,
            detail,
            reused: false,
            downloaded,
            kept,
            failed,
        })
    }

    /// Earlier copies of this document's assets, keyed by source URL
    async fn reusable_assets(&self, id: DocumentId) -> Result<HashMap<String, ReusableAsset>> {
        Ok(self
            .db
            .latest_assets_by_source(id)
            .await?
            .into_iter()
            .map(|(source_url, record)| {
                (
                    source_url,
                    ReusableAsset {
                        file_name: record.file_name,
                        sha256: record.sha256.unwrap_or_default(),
                    },
                )
            })
            .collect())
    }
}

/// Parse the page, locate its content and collect the asset references
fn prepare_document(
    id: DocumentId,
    page: &str,
    base: &Url,
    source: &SourceConfig,
) -> Result<PreparedDocument> {
    let document = Html::parse_document(page);
    let strip = parse_selectors(&source.strip_selectors)?;

    let root = locate_content_root(&document, &source.content_selectors, &strip)?.ok_or_else(
        || Error::ContentNotFound {
            document_id: id.to_string(),
            selectors: source.content_selectors.clone(),
        },
    )?;
    if root.position > 0 {
        tracing::debug!(document_id = id.0, selector = %root.selector, "Content root found through fallback selector");
    }

    let blocks = BlockExtractor::new(Some(base))
        .extract_scoped(&root.element, source.block_scope_tag.as_deref());
    let images = image_intents(&blocks, &root.element, Some(base));
    let attachments = match &source.attachments {
        AttachmentSource::Links {
            selector,
            href_prefix,
        } => attachment_intents(
            &document,
            &parse_selector(selector)?,
            href_prefix.as_deref(),
            Some(base),
        ),
        AttachmentSource::FileApi { .. } | AttachmentSource::None => Vec::new(),
    };

    Ok(PreparedDocument {
        root: root.element,
        blocks,
        images,
        attachments,
    })
}

/// Write one artifact, reporting failures as persistence errors
pub(super) async fn write_artifact(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| {
            PersistenceError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
}
