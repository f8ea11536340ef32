//! Configuration types for campus-materializer

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration for campus-materializer
///
/// Every field has a default matching the university CMS the crate was built
/// for, so `Config::default()` is usable against the live notice board.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Outbound HTTP behaviour (headers, timeouts)
    #[serde(default)]
    pub site: SiteConfig,

    /// The document source being materialized (selectors, attachments, output root)
    #[serde(default)]
    pub source: SourceConfig,

    /// Asset fan-out and worklist pacing
    #[serde(default)]
    pub download: DownloadConfig,

    /// Metadata store location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Heading-sectioned guide pages
    #[serde(default)]
    pub guides: GuideConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.source.content_selectors.is_empty() {
            return Err(Error::Config {
                message: "at least one content selector is required".to_string(),
                key: Some("source.content_selectors".to_string()),
            });
        }
        for selector in self
            .source
            .content_selectors
            .iter()
            .chain(self.source.strip_selectors.iter())
        {
            crate::dom::parse_selector(selector)?;
        }
        if let AttachmentSource::Links { selector, .. } = &self.source.attachments {
            crate::dom::parse_selector(selector)?;
        }
        if let Some(template) = &self.source.url_template
            && !template.contains("{id}")
        {
            return Err(Error::Config {
                message: format!("url template '{}' has no {{id}} placeholder", template),
                key: Some("source.url_template".to_string()),
            });
        }
        if let AttachmentSource::FileApi { url_template } = &self.source.attachments
            && !url_template.contains("{id}")
        {
            return Err(Error::Config {
                message: format!("file api template '{}' has no {{id}} placeholder", url_template),
                key: Some("source.attachments.url_template".to_string()),
            });
        }
        if self.download.max_concurrent_assets == Some(0) {
            return Err(Error::Config {
                message: "max_concurrent_assets must be greater than zero".to_string(),
                key: Some("download.max_concurrent_assets".to_string()),
            });
        }
        crate::dom::parse_selector(&self.guides.content_selector)?;

        let mut seen = HashSet::new();
        for page in &self.guides.pages {
            if !seen.insert(page.key.as_str()) {
                return Err(Error::Config {
                    message: format!("duplicate guide page key '{}'", page.key),
                    key: Some("guides.pages".to_string()),
                });
            }
        }
        Ok(())
    }

    /// Find a guide page by key
    pub fn guide(&self, key: &str) -> Option<&GuidePage> {
        self.guides.pages.iter().find(|p| p.key == key)
    }
}

/// Outbound HTTP settings shared by page fetches and asset downloads
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header (default: Korean first)
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Referer header; some boards refuse downloads without it
    #[serde(default)]
    pub referer: Option<String>,

    /// Timeout for a page fetch (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub page_timeout: Duration,

    /// Timeout for a single asset download (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub asset_timeout: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            referer: None,
            page_timeout: default_timeout(),
            asset_timeout: default_timeout(),
        }
    }
}

/// Where a document's attachments are listed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentSource {
    /// Anchor elements inside the fetched page
    Links {
        /// Selector for the anchors
        selector: String,
        /// Only hrefs starting with this prefix are attachments
        #[serde(default)]
        href_prefix: Option<String>,
    },
    /// A JSON endpoint returning `[{ "file_url", "file_original_name" }]`
    FileApi {
        /// Endpoint URL with an `{id}` placeholder
        url_template: String,
    },
    /// The source has no attachments
    None,
}

impl Default for AttachmentSource {
    fn default() -> Self {
        AttachmentSource::Links {
            selector: ".fileBox .fileList ul li a".to_string(),
            href_prefix: Some("/File/Download.do".to_string()),
        }
    }
}

/// One board/menu source of documents
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Human-readable source name (used in logs)
    #[serde(default = "default_source_name")]
    pub name: String,

    /// Page URL for a document id, used when no URL is registered
    #[serde(default = "default_url_template")]
    pub url_template: Option<String>,

    /// Root directory for per-document output (default: "download")
    #[serde(default = "default_download_root")]
    pub download_root: PathBuf,

    /// Content-root selector chain, tried in order
    #[serde(default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// When the root contains elements of this tag, blocks are read from each of them
    #[serde(default = "default_block_scope_tag")]
    pub block_scope_tag: Option<String>,

    /// Elements removed before extraction and HTML output
    #[serde(default = "default_strip_selectors")]
    pub strip_selectors: Vec<String>,

    /// Where attachments are listed
    #[serde(default)]
    pub attachments: AttachmentSource,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_source_name(),
            url_template: default_url_template(),
            download_root: default_download_root(),
            content_selectors: default_content_selectors(),
            block_scope_tag: default_block_scope_tag(),
            strip_selectors: default_strip_selectors(),
            attachments: AttachmentSource::default(),
        }
    }
}

impl SourceConfig {
    /// Page URL for `id` built from the template, if one is configured
    pub fn page_url(&self, id: crate::types::DocumentId) -> Option<String> {
        self.url_template
            .as_ref()
            .map(|t| t.replace("{id}", &id.to_string()))
    }

    /// Directory holding one document's artifacts
    pub fn document_dir(&self, id: crate::types::DocumentId) -> PathBuf {
        self.download_root.join(id.to_string())
    }
}

/// Asset fan-out and worklist pacing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Cap on concurrent asset downloads within one document (None = all at once)
    #[serde(default)]
    pub max_concurrent_assets: Option<usize>,

    /// Pause between documents of a worklist (default: 1000 ms)
    #[serde(default = "default_inter_document_delay", with = "duration_millis_serde")]
    pub inter_document_delay: Duration,

    /// Documents picked per worklist pass (default: 10)
    #[serde(default = "default_worklist_limit")]
    pub worklist_limit: u32,

    /// Treat completed documents with failed assets as pending (default: true)
    #[serde(default = "default_true")]
    pub retry_partial_documents: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_assets: None,
            inter_document_delay: default_inter_document_delay(),
            worklist_limit: default_worklist_limit(),
            retry_partial_documents: true,
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./campus-materializer.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// A heading-sectioned guide page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuidePage {
    /// Output file stem and lookup key (e.g. "scholarship")
    pub key: String,
    /// Display name used in the HTML title
    pub name: String,
    /// Page URL
    pub url: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Headings and leaves containing any of these terms are dropped
    #[serde(default)]
    pub exclude_terms: Vec<String>,
}

/// Guide page crawling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Output directory for `<key>.html` / `<key>.json` (default: "assets/static")
    #[serde(default = "default_guide_output_dir")]
    pub output_dir: PathBuf,

    /// Selector for the guide body (default: "#body .sub-step")
    #[serde(default = "default_guide_selector")]
    pub content_selector: String,

    /// Prefix of the generated HTML title
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// Retry policy for guide page fetches
    #[serde(default = "default_guide_retry")]
    pub retry: RetryConfig,

    /// Configured guide pages
    #[serde(default)]
    pub pages: Vec<GuidePage>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            output_dir: default_guide_output_dir(),
            content_selector: default_guide_selector(),
            title_prefix: default_title_prefix(),
            retry: default_guide_retry(),
            pages: vec![],
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "ko-KR,ko;q=0.9,en;q=0.8".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_source_name() -> String {
    "notice".to_string()
}

fn default_url_template() -> Option<String> {
    Some(
        "https://www.hoseo.ac.kr/Home/BBSView.mbz?action=MAPP_1708240139&schIdx={id}".to_string(),
    )
}

fn default_download_root() -> PathBuf {
    PathBuf::from("download")
}

fn default_content_selectors() -> Vec<String> {
    vec!["#board_item_list".to_string(), ".bbs-view-content".to_string()]
}

fn default_block_scope_tag() -> Option<String> {
    Some("dd".to_string())
}

fn default_strip_selectors() -> Vec<String> {
    vec!["dt.no-print".to_string()]
}

fn default_inter_document_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_worklist_limit() -> u32 {
    10
}

fn default_database_path() -> PathBuf {
    PathBuf::from("campus-materializer.db")
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_guide_output_dir() -> PathBuf {
    PathBuf::from("assets/static")
}

fn default_guide_selector() -> String {
    "#body .sub-step".to_string()
}

fn default_title_prefix() -> String {
    "호서대학교".to_string()
}

fn default_guide_retry() -> RetryConfig {
    RetryConfig::default()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
