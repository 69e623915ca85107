//! Configuration for store connections.

use std::time::Duration;

/// Connection settings for a remote document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store (e.g. "http://localhost:9200").
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:9200")
    }
}
