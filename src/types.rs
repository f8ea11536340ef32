//! Core types and events for campus-materializer

use serde::{Deserialize, Serialize};

/// Identifier of a source document (notice/menu number in the CMS)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl DocumentId {
    /// Create a new DocumentId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<DocumentId> for i64 {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for DocumentId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl sqlx::Type<sqlx::Sqlite> for DocumentId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for DocumentId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for DocumentId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Role of a downloaded asset within its document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Inline image referenced from the content
    Image,
    /// Attachment linked from the document's file box
    Attachment,
}

impl FileRole {
    /// Storage representation used in the `asset_records.file_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Image => "image",
            FileRole::Attachment => "attachment",
        }
    }

    /// Parse the storage representation
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "image" => Some(FileRole::Image),
            "attachment" => Some(FileRole::Attachment),
            _ => None,
        }
    }

    /// Extension appended when an origin name carries none
    pub fn fallback_extension(&self) -> &'static str {
        match self {
            FileRole::Image => ".jpg",
            FileRole::Attachment => ".pdf",
        }
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted during materialization
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Full pipeline started for a document
    MaterializationStarted {
        /// Document ID
        id: DocumentId,
        /// Page URL being fetched
        url: String,
    },

    /// One asset was stored locally
    AssetDownloaded {
        /// Document ID
        id: DocumentId,
        /// Asset role
        role: FileRole,
        /// Local file name
        file_name: String,
    },

    /// One asset failed; the document continues
    AssetFailed {
        /// Document ID
        id: DocumentId,
        /// Remote URL of the asset
        url: String,
        /// Error message
        error: String,
    },

    /// Document was already complete; the stored detail was returned
    MaterializationReused {
        /// Document ID
        id: DocumentId,
    },

    /// Document artifacts written and committed
    MaterializationComplete {
        /// Document ID
        id: DocumentId,
        /// Number of assets stored
        assets_stored: usize,
        /// Number of assets that failed
        assets_failed: usize,
    },

    /// Document-level failure (recorded on the document status)
    MaterializationFailed {
        /// Document ID
        id: DocumentId,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },

    /// A worklist pass finished
    WorklistFinished {
        /// Documents attempted
        total: usize,
        /// Documents materialized (including reused)
        succeeded: usize,
        /// Documents that failed
        failed: usize,
    },

    /// Guide page crawled and written
    GuideCrawled {
        /// Guide page key
        key: String,
        /// Number of top-level sections
        sections: usize,
    },

    /// Guide page crawl failed
    GuideFailed {
        /// Guide page key
        key: String,
        /// Error message
        error: String,
    },
}
