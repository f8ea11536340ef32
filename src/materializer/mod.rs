//! Orchestration of the materialization pipeline, split into focused submodules.
//!
//! The `Materializer` struct and its methods are organized by domain:
//! - [`pipeline`] - Single-document fetch, extract, download, rewrite and persist
//! - [`worklist`] - Sequential processing of pending documents with pacing
//! - [`guides`] - Heading-sectioned guide pages

mod guides;
mod pipeline;
mod worklist;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use guides::{GuideArtifacts, GuideOutcome, GuideStats};
pub use pipeline::{DocumentDetail, MaterializationResult};
pub use worklist::WorklistSummary;

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::types::Event;

/// Main pipeline instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Materializer {
    /// Metadata store (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to inspect status and asset records
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Network access to the source site
    pub(crate) fetcher: Arc<dyn Fetcher>,
}

impl Materializer {
    /// Create a new Materializer instance
    ///
    /// This initializes all core components:
    /// - Validates the configuration
    /// - Creates the download root
    /// - Opens/creates the SQLite database and runs migrations
    /// - Builds the HTTP fetcher with the site's headers and timeouts
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.source.download_root)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download root '{}': {}",
                        config.source.download_root.display(),
                        e
                    ),
                ))
            })?;

        let db = Database::new(&config.persistence.database_path).await?;
        let fetcher = HttpFetcher::new(&config.site)?;

        // Buffer of 1000 events so slow subscribers only lag, never block the pipeline
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(
            source = %config.source.name,
            download_root = %config.source.download_root.display(),
            guide_pages = config.guides.pages.len(),
            "Materializer initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
        })
    }

    /// Replace the network collaborator
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than 1000 events receives
    /// `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use campus_materializer::{Config, Materializer};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let materializer = Materializer::new(Config::default()).await?;
    ///
    ///     let mut events = materializer.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("Event: {:?}", event);
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the metadata store
    ///
    /// The pool is shared by every clone; queries issued after this fail.
    pub async fn close(&self) {
        self.db.pool().close().await;
        tracing::info!("Materializer closed");
    }

    /// Send an event; having no subscribers is not an error
    pub(crate) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
