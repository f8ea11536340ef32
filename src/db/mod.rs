//! Database layer for campus-materializer
//!
//! Handles SQLite persistence for the document registry, per-document download
//! status and the records of materialized assets.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`documents`] - Document registry and the pending worklist query
//! - [`status`] - Download status transitions
//! - [`assets`] - Asset records and the document commit

use crate::types::{DocumentId, FileRole};
use sqlx::{FromRow, sqlite::SqlitePool};

mod assets;
mod documents;
mod migrations;
mod status;

/// Registered source document
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    /// Source system identifier
    pub id: DocumentId,
    /// Page URL the document is fetched from
    pub source_url: String,
    /// Title as listed by the source, if known
    pub title: Option<String>,
    /// Unix timestamp when the document was registered
    pub created_at: i64,
}

/// Materialization status of one document
#[derive(Debug, Clone, FromRow)]
pub struct DownloadStatus {
    /// Document this status belongs to
    pub document_id: DocumentId,
    /// True once artifacts were written and committed
    pub completed: bool,
    /// Unix timestamp of the last completion
    pub completed_at: Option<i64>,
    /// Last failure message (document-level error or asset failures)
    pub last_error: Option<String>,
    /// Number of assets that failed in the last completed run
    pub failed_assets: i64,
    /// Unix timestamp of the last transition
    pub updated_at: i64,
}

impl DownloadStatus {
    /// True if a re-run should short-circuit to the stored detail
    ///
    /// With `retry_partial` set, a completion that left failed assets behind is
    /// not settled.
    pub fn is_settled(&self, retry_partial: bool) -> bool {
        self.completed && !(retry_partial && self.failed_assets > 0)
    }
}

/// Asset record to upsert when a document is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssetRecord {
    /// Image or attachment
    pub role: FileRole,
    /// Local file name (unique within the document)
    pub file_name: String,
    /// Name suggested by the page
    pub origin_name: String,
    /// Forward-slash path of the local copy
    pub file_path: String,
    /// Remote URL the file was downloaded from
    pub source_url: String,
    /// Hex SHA-256 of the file
    pub sha256: String,
}

/// Stored asset record
#[derive(Debug, Clone, FromRow)]
pub struct AssetRecord {
    /// Document the asset belongs to
    pub document_id: DocumentId,
    /// Storage form of the role (`image` or `attachment`)
    pub file_type: String,
    /// Local file name
    pub file_name: String,
    /// Name suggested by the page
    pub origin_name: String,
    /// Forward-slash path of the local copy
    pub file_path: String,
    /// Remote URL the file was downloaded from
    pub source_url: String,
    /// Hex SHA-256 of the file
    pub sha256: Option<String>,
    /// Unix timestamp of the last upsert
    pub updated_at: i64,
}

impl AssetRecord {
    /// Parsed role, `None` for an unknown storage value
    pub fn role(&self) -> Option<FileRole> {
        FileRole::from_db(&self.file_type)
    }
}

/// Database handle for campus-materializer
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
