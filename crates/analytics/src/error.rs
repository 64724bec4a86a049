//! Error types for `secdata-analytics`.

use thiserror::Error;

/// Failures surfaced by the analytics gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid gateway configuration (e.g. an unusable base URL).
    #[error("config error: {0}")]
    Config(String),

    /// The analytics API answered with a non-2xx status.
    #[error("Remote API error: {status} {status_text}{}", format_body(.body))]
    RemoteApi {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A 2xx response whose body is not valid JSON.
    #[error("Malformed response from analytics API: {0}")]
    MalformedResponse(String),

    /// Connection-level failure (DNS, refused connection, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {body}")
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(crate::safety::sanitize_reqwest_error(&value))
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
