//! HTTP client abstraction for testability

use std::time::Duration;

use super::TileError;

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows mock clients to stand in for the network in
/// tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, TileError>;
}

/// Blocking HTTP client backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default 30 second timeout.
    pub fn new() -> Result<Self, TileError> {
        Self::with_timeout(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
    }

    /// Creates a client with a custom timeout; `None` waits indefinitely.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TileError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("trailframe/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TileError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, TileError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TileError::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TileError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| TileError::Http(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock HTTP client that records requested URLs.
    pub struct MockHttpClient {
        pub response: Result<Vec<u8>, TileError>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new(response: Result<Vec<u8>, TileError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, TileError> {
            self.requests.lock().push(url.to_string());
            self.response.clone()
        }
    }

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::new(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com");
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.requests.lock().len(), 1);
    }

    #[test]
    fn test_mock_client_error() {
        let mock = MockHttpClient::new(Err(TileError::Http("Test error".to_string())));
        assert!(mock.get("http://example.com").is_err());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new().is_ok());
        assert!(ReqwestClient::with_timeout(None).is_ok());
    }
}
