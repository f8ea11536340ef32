//! Test configuration helpers for creating materializers against a mock site

use std::time::Duration;
use tempfile::TempDir;
use campus_materializer::config::RetryConfig;
use campus_materializer::{Config, Materializer};

/// Path of the notice view page on the mock site
pub const VIEW_PATH: &str = "/Home/BBSView.mbz";

/// Configuration pointing every source URL at `site`, with all output under `temp_dir`
///
/// Worklist pacing is disabled and guide retries are fast so tests stay quick.
pub fn site_config(site: &str, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.source.download_root = temp_dir.path().join("download");
    config.source.url_template = Some(format!("{}{}?schIdx={{id}}", site, VIEW_PATH));
    config.site.page_timeout = Duration::from_secs(5);
    config.site.asset_timeout = Duration::from_secs(5);
    config.download.inter_document_delay = Duration::ZERO;
    config.guides.output_dir = temp_dir.path().join("static");
    config.guides.retry = RetryConfig {
        max_attempts: 1,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}

/// Create a Materializer for `site`
///
/// Returns the materializer and temp directory (keep temp_dir alive for test duration)
pub async fn create_site_materializer(site: &str) -> (Materializer, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = site_config(site, &temp_dir);
    let materializer = Materializer::new(config)
        .await
        .expect("Failed to create materializer");
    (materializer, temp_dir)
}
