//! Client configuration.
//!
//! `ClientConfig` carries everything the API client and sync coordinator need
//! to talk to a Pinboard-compatible service. Front ends deserialize it from
//! their own profile files and pass it in; nothing here touches the filesystem.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Public Pinboard v1 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.pinboard.in/v1/";
/// Per-request timeout, also used as the server-down bound for `posts/update`.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Rows requested per `posts/all` page.
pub const DEFAULT_API_PAGE_SIZE: usize = 5000;
/// Minimum spacing between paced API calls.
pub const DEFAULT_RATE_LIMIT_INTERVAL_MS: u64 = 3000;

/// Settings for the remote API client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub rate_limit_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: DEFAULT_API_PAGE_SIZE,
            rate_limit_interval_ms: DEFAULT_RATE_LIMIT_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Config for the public service with the given `user:TOKEN` credential.
    pub fn with_token(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(auth_token.into()),
            ..Self::default()
        }
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    /// Base URL with exactly one trailing slash, so endpoint paths can be appended.
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.api_base_url.trim().trim_end_matches('/'))
    }

    pub fn auth_token(&self) -> Option<String> {
        normalize_text_option(self.auth_token.clone())
    }

    /// Check the values a client cannot work without.
    pub fn validate(&self) -> Result<(), String> {
        let base_url = self.api_base_url.trim();
        if !is_http_url(base_url) {
            return Err(format!(
                "api_base_url must include http:// or https:// (got '{}')",
                compact_text(base_url)
            ));
        }
        if url::Url::parse(base_url).is_err() {
            return Err(format!(
                "api_base_url is not a valid URL: {}",
                compact_text(base_url)
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be greater than zero".to_string());
        }
        Ok(())
    }
}
