//! Sequential processing of pending documents.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::Event;

use super::Materializer;

/// Counts for one worklist pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorklistSummary {
    /// Documents attempted
    pub total: usize,
    /// Documents materialized, including stored details returned as-is
    pub succeeded: usize,
    /// Documents whose materialization failed
    pub failed: usize,
    /// Documents whose stored detail was returned without running the pipeline
    pub reused: usize,
}

impl Materializer {
    /// Materialize every pending document once
    ///
    /// Pending documents are picked newest first, up to the configured
    /// worklist limit, and processed one at a time with the configured pause
    /// between them. A failing document is recorded and skipped; the pass
    /// always continues with the next one.
    pub async fn run_worklist(&self) -> Result<WorklistSummary> {
        self.run_worklist_with_cancel(&CancellationToken::new()).await
    }

    /// Like [`run_worklist`](Self::run_worklist), stopping between documents on SIGINT/SIGTERM
    pub async fn run_worklist_until_shutdown(&self) -> Result<WorklistSummary> {
        let token = CancellationToken::new();
        let signal_token = token.clone();
        let watcher = tokio::spawn(async move {
            crate::wait_for_signal().await;
            signal_token.cancel();
        });

        let summary = self.run_worklist_with_cancel(&token).await;
        watcher.abort();
        summary
    }

    /// Run a worklist pass that stops between documents once `cancel` fires
    ///
    /// The document in flight is always finished; cancellation only prevents
    /// the next one from starting.
    pub async fn run_worklist_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<WorklistSummary> {
        let download = &self.config.download;
        let pending = self
            .db
            .pending_documents(download.worklist_limit, download.retry_partial_documents)
            .await?;

        tracing::info!(pending = pending.len(), "Starting worklist pass");

        let mut summary = WorklistSummary::default();
        for (index, document) in pending.iter().enumerate() {
            if index > 0 && !download.inter_document_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(download.inter_document_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                tracing::info!(
                    remaining = pending.len() - index,
                    "Worklist cancelled, leaving remaining documents pending"
                );
                break;
            }

            summary.total += 1;
            match self.materialize(document.id, false).await {
                Ok(result) => {
                    summary.succeeded += 1;
                    if result.reused {
                        summary.reused += 1;
                    }
                }
                Err(e) => {
                    // Already recorded on the document status
                    summary.failed += 1;
                    tracing::warn!(document_id = document.id.0, error = %e, "Continuing worklist after failed document");
                }
            }
        }

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            reused = summary.reused,
            "Worklist pass finished"
        );
        self.emit(Event::WorklistFinished {
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
        });

        Ok(summary)
    }
}
