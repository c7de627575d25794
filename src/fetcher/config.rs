use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.rule34.xxx/index.php";

/// Page size requested from the API. Only a single page is ever fetched.
pub const DEFAULT_LIMIT: u32 = 60;

/// Configuration for talking to the post API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Direct API endpoint, without query string
    pub base_url: String,

    /// Posts requested per search (default: 60)
    pub limit: u32,

    /// Relay prefixes tried in order after the direct endpoint fails.
    /// The full direct URL is appended verbatim to each prefix.
    pub relays: Vec<String>,

    /// Per-request timeout in seconds (default: 15)
    pub timeout_secs: u64,

    /// User agent string to use
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            limit: DEFAULT_LIMIT,
            relays: vec![
                "https://corsproxy.io/?".to_string(),
                "https://cors.isomorphic-git.org/".to_string(),
            ],
            timeout_secs: 15,
            user_agent: concat!("tagscroll/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Same configuration without any relay prefixes.
    pub fn direct_only(&self) -> Self {
        Self {
            relays: Vec::new(),
            ..self.clone()
        }
    }
}
