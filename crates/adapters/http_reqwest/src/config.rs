//! HTTP adapter configuration.

use serde::Deserialize;

/// Configuration for the automation-fetch and delivery endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL of the nudge API, without a trailing slash.
    pub base_url: String,
    /// Timeout for acknowledged requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for the fire-and-forget beacon path, in seconds. Kept short
    /// so a dying page still gets the send off.
    pub beacon_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            request_timeout_secs: 10,
            beacon_timeout_secs: 3,
        }
    }
}
