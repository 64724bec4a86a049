//! Outbound URL checks and error redaction.
//!
//! Query strings can carry caller-supplied filters (user names, client IPs), so they are dropped
//! from anything that ends up in an error message or a log line.

use crate::error::GatewayError;
use url::Url;

/// Validate the configured analytics base URL.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if the URL does not parse, uses a scheme other than
/// `http`/`https`, has no host, or carries a query or fragment (endpoint paths are appended to
/// the base URL).
pub fn check_base_url(base_url: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(base_url)
        .map_err(|e| GatewayError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(GatewayError::Config(format!(
            "Unsupported base URL scheme '{scheme}' (expected http or https)"
        )));
    }
    if url.host_str().is_none() {
        return Err(GatewayError::Config(format!(
            "Base URL '{base_url}' has no host"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(GatewayError::Config(format!(
            "Base URL '{}' must not contain a query or fragment",
            redact_url(&url)
        )));
    }
    Ok(url)
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_accepts_http_and_https() {
        check_base_url("https://api.example.com/v1").expect("https");
        check_base_url("http://127.0.0.1:8080").expect("http");
    }

    #[test]
    fn base_url_rejects_other_schemes_and_garbage() {
        let err = check_base_url("ftp://files.example.com").unwrap_err();
        assert!(err.to_string().contains("scheme"));
        let err = check_base_url("not a url").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn base_url_rejects_query_and_fragment() {
        for bad in [
            "https://api.example.com/v1?tenant=a",
            "https://api.example.com/v1?",
            "https://api.example.com/v1#frag",
        ] {
            let err = check_base_url(bad).unwrap_err();
            assert!(err.to_string().contains("query or fragment"), "{bad}: {err}");
            assert!(!err.to_string().contains("tenant=a"));
        }
    }

    #[test]
    fn redact_url_drops_query_and_credentials() {
        let url = Url::parse("https://user:pw@api.example.com/events/search?user=alice#x")
            .expect("url");
        let redacted = redact_url(&url);
        assert_eq!(redacted, "https://api.example.com/events/search");
    }
}
