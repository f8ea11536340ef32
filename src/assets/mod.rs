//! Asset materialization: collecting references, downloading them, rewriting
//! the document to point at the local copies.
//!
//! - [`collect`] - Image and attachment intents from the extracted content
//! - [`download`] - Concurrent per-document downloads with per-item isolation
//! - [`rewrite`] - Reference rewriting and the JSON asset/attachment entries

pub mod collect;
pub mod download;
pub mod rewrite;


use serde::{Deserialize, Serialize};

use crate::error::AssetDownloadError;
use crate::types::FileRole;

pub use collect::{attachment_intents, file_api_intents, image_intents, parse_file_api};
pub use download::{AssetDownloader, ReusableAsset};
pub use rewrite::{
    AssetEntry, AttachmentEntry, apply_to_blocks, asset_entries, attachment_entries,
    rewrite_image_sources,
};

/// A pending asset reference, not yet downloaded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIntent {
    /// Absolute source URL
    pub url: String,
    /// Name suggested by the page
    pub origin_name: String,
    /// Image or attachment
    pub role: FileRole,
}

impl FileIntent {
    /// Create an intent
    pub fn new(url: impl Into<String>, origin_name: impl Into<String>, role: FileRole) -> Self {
        Self {
            url: url.into(),
            origin_name: origin_name.into(),
            role,
        }
    }
}

/// A locally stored asset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    /// The intent this asset satisfies
    pub intent: FileIntent,
    /// File name inside the document directory
    pub file_name: String,
    /// Forward-slash path as written to JSON and asset records
    pub local_path: String,
    /// Hex SHA-256 of the file
    pub sha256: String,
    /// True if a copy from an earlier run was kept instead of downloading
    pub reused: bool,
}

/// Result of one asset download
#[derive(Clone, Debug)]
pub enum DownloadOutcome {
    /// The asset is on disk
    Success(StoredAsset),
    /// The asset could not be downloaded; siblings are unaffected
    Failure {
        /// The intent that failed
        intent: FileIntent,
        /// Why it failed
        error: AssetDownloadError,
    },
}

impl DownloadOutcome {
    /// The intent this outcome is for
    pub fn intent(&self) -> &FileIntent {
        match self {
            DownloadOutcome::Success(stored) => &stored.intent,
            DownloadOutcome::Failure { intent, .. } => intent,
        }
    }

    /// The stored asset, if the download succeeded
    pub fn stored(&self) -> Option<&StoredAsset> {
        match self {
            DownloadOutcome::Success(stored) => Some(stored),
            DownloadOutcome::Failure { .. } => None,
        }
    }

    /// True on success
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }
}
