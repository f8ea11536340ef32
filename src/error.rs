//! Error types for campus-materializer
//!
//! Document-level failures (fetch, content root, persistence) surface as [`Error`]
//! and are recorded on the document's download status. Per-asset failures are
//! [`AssetDownloadError`] values carried as data inside download outcomes and never
//! abort a document.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::DocumentId;

/// Result type alias for campus-materializer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for campus-materializer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "source.content_selectors")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// No element matched any selector of the content-root chain
    #[error("content root not found for document {document_id} (tried {})", .selectors.join(", "))]
    ContentNotFound {
        /// Document (or guide page key) being extracted
        document_id: String,
        /// Every selector that was tried, in order
        selectors: Vec<String>,
    },

    /// Page fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Asset download failed
    #[error("asset download error: {0}")]
    AssetDownload(#[from] AssetDownloadError),

    /// Writing or committing a document's artifacts failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document or guide page not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable code for this error, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::ContentNotFound { .. } => "content_not_found",
            Error::Fetch(_) => "fetch_error",
            Error::AssetDownload(_) => "asset_download_error",
            Error::Persistence(_) => "persistence_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Network failures while fetching a page or an asset
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Request exceeded its timeout
    #[error("timed out fetching {url}")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// Could not connect to the remote host
    #[error("connection failed for {url}: {reason}")]
    Connect {
        /// Requested URL
        url: String,
        /// Underlying reason
        reason: String,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be read or decoded
    #[error("failed to read response body from {url}: {reason}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying reason
        reason: String,
    },

    /// URL could not be parsed or resolved
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL text
        url: String,
        /// Parse failure reason
        reason: String,
    },
}

impl FetchError {
    /// Classify a reqwest error for the given URL
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else if let Some(status) = e.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// A single asset that could not be materialized
#[derive(Debug, Clone, Error)]
pub enum AssetDownloadError {
    /// The remote request failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Writing the asset to disk failed
    #[error("failed to write {path}: {reason}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },
}

/// Failures of the two persistence phases
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Writing the HTML or JSON artifact failed
    #[error("failed to write {path}: {reason}")]
    WriteFailed {
        /// Destination path
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Reading a previously stored artifact failed
    #[error("failed to read {path}: {reason}")]
    ReadFailed {
        /// Source path
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Committing asset records and completion failed
    #[error("failed to commit document {document_id}: {reason}")]
    Commit {
        /// Document being committed
        document_id: DocumentId,
        /// Underlying reason
        reason: String,
    },
}
