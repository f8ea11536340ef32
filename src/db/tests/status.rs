use crate::db::*;
use crate::types::DocumentId;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_status_absent_until_first_transition() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert!(db.get_status(DocumentId(1)).await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_status_lifecycle() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = DocumentId(55);

    db.mark_in_progress(id).await.unwrap();
    let status = db.get_status(id).await.unwrap().unwrap();
    assert!(!status.completed);
    assert!(status.last_error.is_none());

    db.mark_failed(id, "content root not found").await.unwrap();
    let status = db.get_status(id).await.unwrap().unwrap();
    assert!(!status.completed);
    assert_eq!(status.last_error.as_deref(), Some("content root not found"));
    assert!(status.completed_at.is_none());

    // A re-run clears the error again
    db.mark_in_progress(id).await.unwrap();
    db.commit_document(id, &[], 0, None).await.unwrap();
    let status = db.get_status(id).await.unwrap().unwrap();
    assert!(status.completed);
    assert!(status.completed_at.is_some());
    assert!(status.last_error.is_none());
    assert!(status.is_settled(true));

    db.close().await;
}

#[tokio::test]
async fn test_completed_document_can_be_reset_by_rerun() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = DocumentId(9);

    db.commit_document(id, &[], 0, None).await.unwrap();
    db.mark_in_progress(id).await.unwrap();

    let status = db.get_status(id).await.unwrap().unwrap();
    assert!(!status.completed);

    db.close().await;
}

#[tokio::test]
async fn test_partial_completion_is_not_settled_when_retrying_partials() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = DocumentId(3);

    db.commit_document(id, &[], 2, Some("2 asset(s) failed"))
        .await
        .unwrap();
    let status = db.get_status(id).await.unwrap().unwrap();

    assert!(status.completed);
    assert_eq!(status.failed_assets, 2);
    assert!(!status.is_settled(true));
    assert!(status.is_settled(false));

    db.close().await;
}
