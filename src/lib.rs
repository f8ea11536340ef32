//! # campus-materializer
//!
//! Content extraction and asset materialization for university CMS pages.
//!
//! ## Design Philosophy
//!
//! campus-materializer is designed to be:
//! - **Idempotent** - Re-running a completed document returns what is on disk
//! - **Failure-isolating** - One broken asset never costs the rest of its document,
//!   one broken document never stops a worklist
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use campus_materializer::{Config, DocumentId, Materializer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let materializer = Materializer::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = materializer.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let result = materializer.materialize(DocumentId(1234), false).await?;
//!     println!("{} blocks", result.detail.content.len());
//!
//!     materializer.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Asset collection, download and reference rewriting
pub mod assets;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Owned DOM tree and content-root location
pub mod dom;
/// Error types
pub mod error;
/// Block, section, list and table extraction
pub mod extract;
/// Page and asset fetching
pub mod fetcher;
/// Pipeline orchestration (documents, worklists, guide pages)
pub mod materializer;
/// Retry logic with exponential backoff
pub mod retry;
/// Text normalization
pub mod text;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{AttachmentSource, Config, GuidePage, RetryConfig};
pub use db::Database;
pub use error::{
    AssetDownloadError, DatabaseError, Error, FetchError, PersistenceError, Result,
};
pub use extract::{ContentBlock, ImageBlock, IndexedMap, Section, SectionChild, TableData};
pub use fetcher::{Fetcher, HttpFetcher};
pub use materializer::{
    DocumentDetail, GuideOutcome, GuideStats, MaterializationResult, Materializer,
    WorklistSummary,
};
pub use types::{DocumentId, Event, FileRole};

/// Helper function to run one worklist pass with graceful signal handling.
///
/// The pass stops between documents on a termination signal; the materializer
/// is closed afterwards either way.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use campus_materializer::{Config, Materializer, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let materializer = Materializer::new(Config::default()).await?;
///
///     let summary = run_with_shutdown(materializer).await?;
///     println!("{} of {} documents materialized", summary.succeeded, summary.total);
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(materializer: Materializer) -> Result<WorklistSummary> {
    let summary = materializer.run_worklist_until_shutdown().await;
    materializer.close().await;
    summary
}

#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
