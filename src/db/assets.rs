//! Asset records and the document commit.

use sqlx::SqliteConnection;
use std::collections::HashMap;

use crate::error::DatabaseError;
use crate::types::DocumentId;
use crate::{Error, Result};

use super::{AssetRecord, Database, NewAssetRecord};

impl Database {
    /// Insert or replace the record keyed by `(document, file_name)`
    pub async fn upsert_asset_record(&self, id: DocumentId, record: &NewAssetRecord) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;
        Self::upsert_asset_record_on(&mut *conn, id, record).await
    }

    async fn upsert_asset_record_on(
        conn: &mut SqliteConnection,
        id: DocumentId,
        record: &NewAssetRecord,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO asset_records
                (document_id, file_type, file_name, origin_name, file_path, source_url, sha256, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(document_id, file_name) DO UPDATE SET
                file_type = excluded.file_type,
                origin_name = excluded.origin_name,
                file_path = excluded.file_path,
                source_url = excluded.source_url,
                sha256 = excluded.sha256,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(record.role.as_str())
        .bind(&record.file_name)
        .bind(&record.origin_name)
        .bind(&record.file_path)
        .bind(&record.source_url)
        .bind(&record.sha256)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert asset record: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// All asset records of a document, by file name
    pub async fn list_asset_records(&self, id: DocumentId) -> Result<Vec<AssetRecord>> {
        let records = sqlx::query_as::<_, AssetRecord>(
            r#"
            SELECT document_id, file_type, file_name, origin_name, file_path, source_url, sha256, updated_at
            FROM asset_records
            WHERE document_id = ?
            ORDER BY file_name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list asset records: {}",
                e
            )))
        })?;

        Ok(records)
    }

    /// Newest record of a document per source URL
    ///
    /// A forced run can leave an older record for the same URL under another
    /// file name; the most recently updated one wins.
    pub async fn latest_assets_by_source(&self, id: DocumentId) -> Result<HashMap<String, AssetRecord>> {
        let records = sqlx::query_as::<_, AssetRecord>(
            r#"
            SELECT document_id, file_type, file_name, origin_name, file_path, source_url, sha256, updated_at
            FROM asset_records
            WHERE document_id = ?
            ORDER BY updated_at, rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to load asset records by source: {}",
                e
            )))
        })?;

        Ok(records
            .into_iter()
            .map(|record| (record.source_url.clone(), record))
            .collect())
    }

    /// Second persistence phase: upsert asset records and flip completion
    ///
    /// Runs in one transaction; on error nothing is committed and the document
    /// keeps its previous status.
    pub async fn commit_document(
        &self,
        id: DocumentId,
        records: &[NewAssetRecord],
        failed_assets: usize,
        last_error: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        for record in records {
            Self::upsert_asset_record_on(&mut *tx, id, record).await?;
        }

        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO download_status
                (document_id, completed, completed_at, last_error, failed_assets, updated_at)
            VALUES (?, 1, ?, ?, ?, ?)
            ON CONFLICT(document_id) DO UPDATE SET
                completed = 1,
                completed_at = excluded.completed_at,
                last_error = excluded.last_error,
                failed_assets = excluded.failed_assets,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(last_error)
        .bind(failed_assets as i64)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark document complete: {}",
                e
            )))
        })?;

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit document: {}",
                e
            )))
        })?;

        Ok(())
    }
}
