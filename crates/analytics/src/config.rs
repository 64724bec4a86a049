//! Configuration records for the analytics gateway and the response shaper.
//!
//! Both records are built once at startup and are read-only afterwards.

use std::time::Duration;

/// Default analytics API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.secdata.io/v1";
/// Default cap on the number of items returned from a list response.
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default cap on the serialized response size (characters).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 50_000;

/// Outbound API settings: where to send requests and which credentials to attach.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
    /// `None` = rely on transport defaults.
    pub request_timeout: Option<Duration>,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_key: String::new(),
            secret_key: String::new(),
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// True when either credential is empty (requests will still be attempted).
    #[must_use]
    pub fn has_missing_credentials(&self) -> bool {
        self.access_key.is_empty() || self.secret_key.is_empty()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// Keep credentials out of debug output.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("access_key", &redacted(&self.access_key))
            .field("secret_key", &redacted(&self.secret_key))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn redacted(v: &str) -> &'static str {
    if v.is_empty() { "<empty>" } else { "***" }
}

/// Response size limits applied by [`crate::response_shaping::ResponseShaper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapingConfig {
    pub max_results: usize,
    pub max_response_size: usize,
    /// When false, string truncation and total-size enforcement are skipped.
    pub enable_truncation: bool,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            enable_truncation: true,
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api: ApiConfig,
    pub shaping: ShapingConfig,
}
