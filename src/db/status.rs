//! Download status transitions.
//!
//! absent → in progress (`completed = 0`) → complete, or in progress with
//! `last_error` on failure. Every transition is an upsert, so a re-run can
//! overwrite any earlier state.

use crate::error::DatabaseError;
use crate::types::DocumentId;
use crate::{Error, Result};

use super::{Database, DownloadStatus};

impl Database {
    /// Get the status row of a document
    pub async fn get_status(&self, id: DocumentId) -> Result<Option<DownloadStatus>> {
        let status = sqlx::query_as::<_, DownloadStatus>(
            r#"
            SELECT document_id, completed, completed_at, last_error, failed_assets, updated_at
            FROM download_status
            WHERE document_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get download status: {}",
                e
            )))
        })?;

        Ok(status)
    }

    /// Mark a document as in progress, clearing any earlier error
    pub async fn mark_in_progress(&self, id: DocumentId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO download_status (document_id, completed, last_error, failed_assets, updated_at)
            VALUES (?, 0, NULL, 0, ?)
            ON CONFLICT(document_id) DO UPDATE SET
                completed = 0,
                last_error = NULL,
                failed_assets = 0,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark document in progress: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record a document-level failure; the document stays incomplete
    pub async fn mark_failed(&self, id: DocumentId, error: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO download_status (document_id, completed, last_error, failed_assets, updated_at)
            VALUES (?, 0, ?, 0, ?)
            ON CONFLICT(document_id) DO UPDATE SET
                completed = 0,
                last_error = excluded.last_error,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark document failed: {}",
                e
            )))
        })?;

        Ok(())
    }
}
