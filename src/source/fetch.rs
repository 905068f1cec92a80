//! Single-request HTTP fetches against the sensor.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;

use crate::error::FetchError;

/// Fetches the raw body behind an endpoint path.
///
/// Implementations resolve only for a completed request with a success
/// status; everything else is an error the caller drops.
#[async_trait]
pub trait MetricFetcher: Send + Sync + 'static {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Headers that keep every proxy and client cache out of the way.
pub fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, max-age=0"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// [`MetricFetcher`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher for the sensor at `base_url` (e.g. `http://co2meter.local`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl MetricFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.url_for(path))
            .headers(no_cache_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_fetch_sends_no_cache_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/co2")
            .match_header("cache-control", "no-cache, no-store, max-age=0")
            .match_header("pragma", "no-cache")
            .with_status(200)
            .with_body("450")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(server.url());
        let body = fetcher.fetch("/co2").await.unwrap();

        assert_eq!(body, "450");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/temp")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(server.url());
        let err = fetcher.fetch("/temp").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Port 9 (discard) is almost never listening locally.
        let fetcher = HttpFetcher::new("http://127.0.0.1:9");
        let err = fetcher.fetch("/co2").await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Connection(_) | FetchError::Http(_) | FetchError::Timeout
        ));
    }

    #[tokio::test]
    async fn test_fetch_path_without_slash() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Exact("/humidity".to_string()))
            .with_body("41.2")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(format!("{}/", server.url()));
        assert_eq!(fetcher.base_url(), server.url());
        assert_eq!(fetcher.fetch("humidity").await.unwrap(), "41.2");
        mock.assert_async().await;
    }
}
