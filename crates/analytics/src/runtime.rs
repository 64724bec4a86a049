//! Analytics API gateway.
//!
//! Every operation is exactly one authenticated GET: no retries, no pagination, no caching.
//! Successful bodies are parsed as JSON and run through the [`ResponseShaper`].

use crate::config::ApiConfig;
use crate::error::{GatewayError, Result};
use crate::queries::{
    AuditLogsQuery, DnsTimelineQuery, DnssecTimelineQuery, DomainAnalysisQuery, Endpoint,
    EventsStatsQuery, EventsTimelineQuery, IdpIncidentsQuery, ResolverMetricsQuery,
    SearchEventsQuery,
};
use crate::response_shaping::ResponseShaper;
use crate::safety::{check_base_url, redact_url};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";
pub const SECRET_KEY_HEADER: &str = "X-Secret-Key";

/// Max chars of an error body kept in [`GatewayError::RemoteApi`].
const ERROR_BODY_EXCERPT_CHARS: usize = 500;

#[derive(Clone)]
pub struct AnalyticsGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    base_url: String,
    config: ApiConfig,
    client: Client,
    shaper: ResponseShaper,
}

impl AnalyticsGateway {
    /// Build a gateway from static configuration.
    ///
    /// The resulting instance is immutable and safe to share across tasks.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the base URL is invalid.
    pub fn new(config: ApiConfig, shaper: ResponseShaper) -> Result<Self> {
        check_base_url(&config.base_url)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(GatewayInner {
                base_url,
                config,
                client: Client::new(),
                shaper,
            }),
        })
    }

    #[must_use]
    pub fn shaper(&self) -> &ResponseShaper {
        &self.inner.shaper
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub async fn search_events(&self, query: &SearchEventsQuery) -> Result<Value> {
        self.get(Endpoint::SearchEvents, query).await
    }

    pub async fn get_events_timeline(&self, query: &EventsTimelineQuery) -> Result<Value> {
        self.get(Endpoint::EventsTimeline, query).await
    }

    pub async fn get_events_stats(&self, query: &EventsStatsQuery) -> Result<Value> {
        self.get(Endpoint::EventsStats, query).await
    }

    pub async fn get_dns_timeline(&self, query: &DnsTimelineQuery) -> Result<Value> {
        self.get(Endpoint::DnsTimeline, query).await
    }

    pub async fn get_dnssec_timeline(&self, query: &DnssecTimelineQuery) -> Result<Value> {
        self.get(Endpoint::DnssecTimeline, query).await
    }

    pub async fn get_ioc_count(&self) -> Result<Value> {
        self.get(Endpoint::IocCount, &()).await
    }

    pub async fn get_resolver_metrics(&self, query: &ResolverMetricsQuery) -> Result<Value> {
        self.get(Endpoint::ResolverMetrics, query).await
    }

    pub async fn analyze_domain(&self, query: &DomainAnalysisQuery) -> Result<Value> {
        self.get(Endpoint::DomainAnalysis, query).await
    }

    pub async fn get_audit_logs(&self, query: &AuditLogsQuery) -> Result<Value> {
        self.get(Endpoint::AuditLogs, query).await
    }

    pub async fn get_idp_incidents(&self, query: &IdpIncidentsQuery) -> Result<Value> {
        self.get(Endpoint::IdpIncidents, query).await
    }

    /// Issue one GET against `endpoint` and return the shaped JSON body.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RemoteApi`] for non-2xx responses
    /// - [`GatewayError::MalformedResponse`] if a 2xx body is not JSON
    /// - [`GatewayError::Transport`] for connection-level failures
    pub async fn get(&self, endpoint: Endpoint, query: &impl Serialize) -> Result<Value> {
        let inner = &self.inner;
        let query = serde_json::to_value(query)
            .map_err(|e| GatewayError::Config(format!("cannot encode query parameters: {e}")))?;
        let pairs = query_pairs(&query)?;
        let url = build_url(&inner.base_url, endpoint.path(), &pairs)?;

        let mut request = inner
            .client
            .get(url.clone())
            .header(ACCESS_KEY_HEADER, &inner.config.access_key)
            .header(SECRET_KEY_HEADER, &inner.config.secret_key)
            .header(CONTENT_TYPE, "application/json");
        if let Some(timeout) = inner.config.request_timeout {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(
            url = %redact_url(&url),
            params = pairs.len(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "analytics API request finished"
        );

        if !status.is_success() {
            return Err(GatewayError::RemoteApi {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: body_excerpt(&bytes),
            });
        }

        let raw: Value = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        Ok(inner.shaper.shape(raw))
    }
}

/// Flatten a serialized query record into ordered `(key, value)` pairs.
///
/// Null values are skipped; arrays produce one pair per element.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if the record does not serialize to an object (or unit).
pub fn query_pairs(query: &Value) -> Result<Vec<(String, String)>> {
    let map = match query {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(GatewayError::Config(format!(
                "query parameters must be an object, got {other}"
            )));
        }
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| (key.clone(), value_to_string(v))),
            ),
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    Ok(pairs)
}

fn build_url(base_url: &str, path: &str, pairs: &[(String, String)]) -> Result<Url> {
    let mut url = Url::parse(&format!("{base_url}{path}"))
        .map_err(|e| GatewayError::Config(format!("Invalid URL: {e}")))?;
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn body_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(ERROR_BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
