use std::time::Duration;

use super::HttpClient;
use async_trait::async_trait;

/// Plain reqwest transport with a per-request timeout.
pub struct BasicClient {
    inner: reqwest::Client,
    timeout: Option<Duration>,
}

impl BasicClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Every request fails with a transport error once `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: reqwest::Client::new(),
            timeout: Some(timeout),
        }
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if let Some(t) = self.timeout {
            req.timeout_mut().get_or_insert(t);
        }
        self.inner.execute(req).await
    }
}
