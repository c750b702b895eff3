//! Direct content fetching.
//!
//! The router's first two acquisition tiers go through a
//! [`ContentFetcher`]. [`HttpFetcher`] serves `http(s)://` with reqwest and
//! `file://` from disk.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// FetchResponse
// ============================================================================

/// A completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status (synthesized for `file://`).
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Response body.
    pub body: String,
}

impl FetchResponse {
    /// Creates a `200 OK` response.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    /// Creates a response with an empty body.
    #[must_use]
    pub fn status(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: String::new(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// ContentFetcher
// ============================================================================

/// Fetches a URL's text.
///
/// An `Ok` with a non-2xx status and an `Err` both count as a failed tier.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches `url`.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

// ============================================================================
// HttpFetcher
// ============================================================================

/// Default fetcher: reqwest for `http(s)`, the filesystem for `file`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a default reqwest client.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher over an existing client.
    #[inline]
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_file(url: &Url) -> Result<FetchResponse> {
        let path = url
            .to_file_path()
            .map_err(|()| Error::connection(format!("not a local file URL: {url}")))?;

        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FetchResponse::status(404, "Not Found")),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_http(&self, url: Url) -> Result<FetchResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let parsed = Url::parse(url)?;
        trace!(%url, "Fetching content");

        match parsed.scheme() {
            "file" => Self::fetch_file(&parsed).await,
            "http" | "https" => self.fetch_http(parsed).await,
            other => Err(Error::connection(format!("unsupported URL scheme: {other}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ok_range() {
        assert!(FetchResponse::ok("x").is_ok());
        assert!(FetchResponse::status(204, "No Content").is_ok());
        assert!(!FetchResponse::status(304, "Not Modified").is_ok());
        assert!(!FetchResponse::status(404, "Not Found").is_ok());
    }

    #[tokio::test]
    async fn test_file_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = dir.path().join("home.html");
        std::fs::write(&page, "<h1>Home</h1>").expect("write");

        let url = Url::from_file_path(&page).expect("file url");
        let response = HttpFetcher::new().fetch(url.as_str()).await.expect("fetch");
        assert!(response.is_ok());
        assert_eq!(response.body, "<h1>Home</h1>");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = Url::from_file_path(dir.path().join("nope.html")).expect("file url");

        let response = HttpFetcher::new().fetch(url.as_str()).await.expect("fetch");
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_relative_url_is_error() {
        let err = HttpFetcher::new().fetch("home.html").await.unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let err = HttpFetcher::new().fetch("ftp://host/x.html").await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }
}
