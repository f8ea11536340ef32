use crate::db::*;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_database_creation() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(db.pool())
    .await
    .unwrap();

    for expected in ["asset_records", "documents", "download_status", "schema_version"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, got {tables:?}"
        );
    }

    db.close().await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();

    // First open applies v1
    let db = Database::new(temp_file.path()).await.unwrap();
    db.close().await;

    // Second open must not re-apply it
    let db = Database::new(temp_file.path()).await.unwrap();
    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);

    db.close().await;
}

#[tokio::test]
async fn test_database_creates_parent_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("meta.db");

    let db = Database::new(&path).await.unwrap();
    assert!(path.exists());

    db.close().await;
}
