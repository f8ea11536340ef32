//! Shared test helpers: an in-memory fetcher and Materializer construction.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::tempdir;

use crate::config::{Config, RetryConfig};
use crate::db::Database;
use crate::error::{AssetDownloadError, FetchError};
use crate::fetcher::{DownloadedFile, Fetcher};

use super::Materializer;

/// URL template used by test materializers
pub(crate) const PAGE_TEMPLATE: &str = "https://www.example.ac.kr/Home/BBSView.mbz?schIdx={id}";

/// Page URL of a document under [`PAGE_TEMPLATE`]
pub(crate) fn page_url(id: i64) -> String {
    PAGE_TEMPLATE.replace("{id}", &id.to_string())
}

/// Fetcher serving canned pages and assets from memory
///
/// Unknown URLs answer 404. Every call to `download` is counted, including
/// failing ones.
#[derive(Default)]
pub(crate) struct MockFetcher {
    pages: HashMap<String, String>,
    assets: HashMap<String, Result<Vec<u8>, u16>>,
    /// Remaining 503 answers per page URL
    page_failures: Mutex<HashMap<String, usize>>,
    page_fetches: Mutex<HashMap<String, usize>>,
    page_fetch_times: Mutex<Vec<Instant>>,
    downloads: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Answer 503 to the first `failures` fetches of `url`
    pub(crate) fn with_page_failures(self, url: &str, failures: usize) -> Self {
        self.page_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), failures);
        self
    }

    pub(crate) fn with_asset(mut self, url: &str, bytes: &[u8]) -> Self {
        self.assets.insert(url.to_string(), Ok(bytes.to_vec()));
        self
    }

    pub(crate) fn with_failing_asset(mut self, url: &str, status: u16) -> Self {
        self.assets.insert(url.to_string(), Err(status));
        self
    }

    /// Number of `download` calls so far
    pub(crate) fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of `fetch_page` calls for `url` so far
    pub(crate) fn page_fetch_count(&self, url: &str) -> usize {
        self.page_fetches
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// When each `fetch_page` call started, in call order
    pub(crate) fn page_fetch_times(&self) -> Vec<Instant> {
        self.page_fetch_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.page_fetch_times.lock().unwrap().push(Instant::now());
        *self
            .page_fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if let Some(remaining) = self.page_failures.lock().unwrap().get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }

        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadedFile, AssetDownloadError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        let bytes = match self.assets.get(url) {
            Some(Ok(bytes)) => bytes.clone(),
            Some(Err(status)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }
                .into());
            }
            None => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }
                .into());
            }
        };

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| AssetDownloadError::Write {
                path: dest.to_path_buf(),
                reason: e.to_string(),
            })?;

        let digest = Sha256::digest(&bytes);
        Ok(DownloadedFile {
            bytes: bytes.len() as u64,
            sha256: digest.iter().map(|b| format!("{:02x}", b)).collect(),
        })
    }
}

/// Test configuration rooted in `root`: no pacing, fast guide retries
pub(crate) fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = root.join("test.db");
    config.source.download_root = root.join("download");
    config.source.url_template = Some(PAGE_TEMPLATE.to_string());
    config.download.inter_document_delay = Duration::ZERO;
    config.guides.output_dir = root.join("static");
    config.guides.retry = RetryConfig {
        max_attempts: 2,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}

/// Helper to create a test Materializer backed by `fetcher`.
/// Returns the materializer, the shared fetcher and the tempdir (which must be kept alive).
pub(crate) async fn create_test_materializer(
    fetcher: MockFetcher,
) -> (Materializer, Arc<MockFetcher>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let (materializer, fetcher) = materializer_with_config(config, fetcher).await;
    (materializer, fetcher, temp_dir)
}

/// Build a Materializer from an explicit configuration
pub(crate) async fn materializer_with_config(
    config: Config,
    fetcher: MockFetcher,
) -> (Materializer, Arc<MockFetcher>) {
    std::fs::create_dir_all(&config.source.download_root).unwrap();
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
    let fetcher = Arc::new(fetcher);

    let materializer = Materializer {
        db: Arc::new(db),
        event_tx,
        config: Arc::new(config),
        fetcher: fetcher.clone(),
    };
    (materializer, fetcher)
}
