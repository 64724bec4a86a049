//! Tool dispatch: argument bag → typed query → gateway call → MCP tool result.

use crate::catalog::ToolCatalog;
use crate::error::{Result, ServerError};
use rmcp::model::{CallToolResult, Content, Tool};
use secdata_analytics::AnalyticsGateway;
use secdata_analytics::queries::{
    AuditLogsQuery, DnsTimelineQuery, DnssecTimelineQuery, DomainAnalysisQuery, Endpoint,
    EventsStatsQuery, EventsTimelineQuery, IdpIncidentsQuery, ResolverMetricsQuery,
    SearchEventsQuery, scalar,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Appended to error text that points at an oversized response.
pub const SIZE_HINT: &str =
    "Hint: use more specific filters or pagination to reduce the response size.";

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    SearchEvents(SearchEventsQuery),
    EventsTimeline(EventsTimelineQuery),
    EventsStats(EventsStatsQuery),
    DnsTimeline(DnsTimelineQuery),
    DnssecTimeline(DnssecTimelineQuery),
    IocCount,
    ResolverMetrics(ResolverMetricsQuery),
    AnalyzeDomain(DomainAnalysisQuery),
    AuditLogs(AuditLogsQuery),
    IdpIncidents(IdpIncidentsQuery),
}

impl ToolCall {
    /// Parse the argument bag for `endpoint`.
    ///
    /// Absent/null `arguments` is treated as an empty bag. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// - [`ServerError::MissingRequiredParameter`] if a required field is absent
    /// - [`ServerError::InvalidArguments`] if the bag is not an object, or a field holds an
    ///   array/object where a scalar is expected
    pub fn parse(tool: &str, endpoint: Endpoint, arguments: Value) -> Result<Self> {
        Ok(match endpoint {
            Endpoint::SearchEvents => Self::SearchEvents(parse_args(tool, arguments)?),
            Endpoint::EventsTimeline => Self::EventsTimeline(parse_args(tool, arguments)?),
            Endpoint::EventsStats => Self::EventsStats(parse_args(tool, arguments)?),
            Endpoint::DnsTimeline => Self::DnsTimeline(parse_args(tool, arguments)?),
            Endpoint::DnssecTimeline => Self::DnssecTimeline(parse_args(tool, arguments)?),
            Endpoint::IocCount => Self::IocCount,
            Endpoint::ResolverMetrics => Self::ResolverMetrics(parse_args(tool, arguments)?),
            Endpoint::DomainAnalysis => {
                let args: DomainAnalysisArgs = parse_args(tool, arguments)?;
                Self::AnalyzeDomain(args.into_query(tool)?)
            }
            Endpoint::AuditLogs => Self::AuditLogs(parse_args(tool, arguments)?),
            Endpoint::IdpIncidents => Self::IdpIncidents(parse_args(tool, arguments)?),
        })
    }

    /// Run the call against the analytics API (exactly one request).
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn execute(&self, gateway: &AnalyticsGateway) -> Result<Value> {
        let value = match self {
            Self::SearchEvents(q) => gateway.search_events(q).await?,
            Self::EventsTimeline(q) => gateway.get_events_timeline(q).await?,
            Self::EventsStats(q) => gateway.get_events_stats(q).await?,
            Self::DnsTimeline(q) => gateway.get_dns_timeline(q).await?,
            Self::DnssecTimeline(q) => gateway.get_dnssec_timeline(q).await?,
            Self::IocCount => gateway.get_ioc_count().await?,
            Self::ResolverMetrics(q) => gateway.get_resolver_metrics(q).await?,
            Self::AnalyzeDomain(q) => gateway.analyze_domain(q).await?,
            Self::AuditLogs(q) => gateway.get_audit_logs(q).await?,
            Self::IdpIncidents(q) => gateway.get_idp_incidents(q).await?,
        };
        Ok(value)
    }
}

/// Raw form of the `analyze_domain` arguments, before the required field is checked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DomainAnalysisArgs {
    #[serde(deserialize_with = "scalar")]
    fqdn: Option<String>,
    #[serde(deserialize_with = "scalar")]
    include_subdomains: Option<String>,
    #[serde(deserialize_with = "scalar")]
    lookback_days: Option<String>,
}

impl DomainAnalysisArgs {
    fn into_query(self, tool: &str) -> Result<DomainAnalysisQuery> {
        let fqdn = self
            .fqdn
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServerError::MissingRequiredParameter {
                tool: tool.to_string(),
                parameter: "fqdn",
            })?;
        Ok(DomainAnalysisQuery {
            fqdn,
            include_subdomains: self.include_subdomains,
            lookback_days: self.lookback_days,
        })
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ServerError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Routes tool calls from the protocol layer to the analytics gateway.
pub struct ToolDispatcher {
    gateway: AnalyticsGateway,
    catalog: ToolCatalog,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(gateway: AnalyticsGateway, catalog: ToolCatalog) -> Self {
        Self { gateway, catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// The tool list advertised on `tools/list`.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.catalog.list_tools()
    }

    /// Resolve, validate and execute a tool call, returning the bounded JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown/disabled, the arguments are invalid, or the
    /// gateway call fails. Validation errors never reach the network.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value> {
        let descriptor = self.catalog.lookup(name)?;
        let call = ToolCall::parse(name, descriptor.endpoint, arguments)?;
        debug!(tool = %name, endpoint = descriptor.endpoint.path(), "dispatching tool call");
        call.execute(&self.gateway).await
    }

    /// Execute a tool call and convert the outcome into an MCP tool result.
    ///
    /// Failures become `isError` results; they are never propagated to the transport.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        match self.invoke(name, arguments).await {
            Ok(body) => {
                let text = serde_json::to_string(&body).unwrap_or_else(|_| body.to_string());
                CallToolResult::success(vec![Content::text(text)])
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                error_result(&e)
            }
        }
    }
}

/// Build the `isError` payload for a failed call.
#[must_use]
pub fn error_result(error: &ServerError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error_text(error))])
}

fn error_text(error: &ServerError) -> String {
    let mut text = format!("Error: {error}");
    if mentions_size(&text) {
        text.push_str("\n\n");
        text.push_str(SIZE_HINT);
    }
    text
}

fn mentions_size(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["size", "truncat", "too large"]
        .iter()
        .any(|needle| lower.contains(needle))
}
