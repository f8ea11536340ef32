//! HTTP access to the source site
//!
//! The [`Fetcher`] trait is the seam between the pipeline and the network. The
//! materializer only ever talks to a `dyn Fetcher`; [`HttpFetcher`] is the
//! reqwest-backed implementation used in production and in tests against a
//! mock server.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::SiteConfig;
use crate::error::{AssetDownloadError, Error, FetchError, Result};

/// A file written to disk by [`Fetcher::download`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Bytes written
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the content
    pub sha256: String,
}

/// Retrieves pages and assets from the source site
///
/// Every call carries its own timeout; a timeout is reported like any other
/// network failure.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a page (or JSON endpoint) as text
    async fn fetch_page(&self, url: &str) -> std::result::Result<String, FetchError>;

    /// Stream an asset to `dest`, hashing it on the way
    ///
    /// A partially written file is removed on failure.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
    ) -> std::result::Result<DownloadedFile, AssetDownloadError>;
}

/// reqwest-backed [`Fetcher`]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    page_timeout: Duration,
    asset_timeout: Duration,
}

impl HttpFetcher {
    /// Build a client with the site's headers and timeouts
    ///
    /// # Errors
    /// Returns error if a header value is invalid or the client cannot be created
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("site.accept_language", &site.accept_language)?,
        );
        if let Some(referer) = &site.referer {
            headers.insert(REFERER, header_value("site.referer", referer)?);
        }

        let client = reqwest::Client::builder()
            .user_agent(site.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            page_timeout: site.page_timeout,
            asset_timeout: site.asset_timeout,
        })
    }

    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<reqwest::Response, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Config {
        message: format!("invalid header value '{}': {}", value, e),
        key: Some(key.to_string()),
    })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> std::result::Result<String, FetchError> {
        tracing::debug!(url, "fetching page");
        let response = self.get(url, self.page_timeout).await?;
        response.text().await.map_err(|e| FetchError::from_reqwest(url, e))
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
    ) -> std::result::Result<DownloadedFile, AssetDownloadError> {
        let mut response = self.get(url, self.asset_timeout).await?;

        let write_error = |e: std::io::Error| AssetDownloadError::Write {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;

        let mut hasher = Sha256::new();
        let mut bytes = 0u64;
        let streamed: std::result::Result<(), AssetDownloadError> = async {
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?
            {
                hasher.update(&chunk);
                bytes += chunk.len() as u64;
                file.write_all(&chunk).await.map_err(write_error)?;
            }
            file.flush().await.map_err(write_error)?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                tracing::debug!(path = %dest.display(), error = %remove_err, "could not remove partial download");
            }
            return Err(e);
        }

        Ok(DownloadedFile {
            bytes,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        let site = SiteConfig {
            referer: Some("https://www.example.ac.kr/".to_string()),
            page_timeout: Duration::from_millis(500),
            asset_timeout: Duration::from_millis(500),
            ..SiteConfig::default()
        };
        HttpFetcher::new(&site).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_sends_site_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/view"))
            .and(header("accept", "*/*"))
            .and(header("referer", "https://www.example.ac.kr/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch_page(&format!("{}/view", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_fetch_page_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_page(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_page(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let err = fetcher().fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_download_writes_file_and_hashes_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("a.jpg");
        let file = fetcher()
            .download(&format!("{}/a.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(file.bytes, 3);
        assert_eq!(
            file.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");
        let err = fetcher()
            .download(&format!("{}/missing.pdf", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AssetDownloadError::Fetch(FetchError::Status { status: 404, .. })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_into_missing_directory_is_write_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("nope").join("x.jpg");
        let err = fetcher()
            .download(&format!("{}/x.jpg", server.uri()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetDownloadError::Write { .. }));
    }
}
