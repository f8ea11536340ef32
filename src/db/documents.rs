//! Document registry and the pending worklist query.

use crate::error::DatabaseError;
use crate::types::DocumentId;
use crate::{Error, Result};

use super::{Database, Document};

impl Database {
    /// Register a document, or update its URL and title
    ///
    /// The listing scrapers that discover documents call this; the registration
    /// time of an existing row is kept.
    pub async fn upsert_document(
        &self,
        id: DocumentId,
        source_url: &str,
        title: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO documents (id, source_url, title, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                source_url = excluded.source_url,
                title = COALESCE(excluded.title, documents.title)
            "#,
        )
        .bind(id)
        .bind(source_url)
        .bind(title)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert document: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a registered document
    pub async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, source_url, title, created_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get document: {}",
                e
            )))
        })?;

        Ok(document)
    }

    /// Registered documents that still need materialization, newest id first
    ///
    /// A document is pending when it has no status row or an incomplete one.
    /// With `include_partial`, completed documents with failed assets are
    /// pending too.
    pub async fn pending_documents(
        &self,
        limit: u32,
        include_partial: bool,
    ) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT d.id, d.source_url, d.title, d.created_at
            FROM documents d
            LEFT JOIN download_status s ON s.document_id = d.id
            WHERE s.document_id IS NULL
               OR s.completed = 0
               OR (? AND s.failed_assets > 0)
            ORDER BY d.id DESC
            LIMIT ?
            "#,
        )
        .bind(include_partial)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list pending documents: {}",
                e
            )))
        })?;

        Ok(documents)
    }
}
