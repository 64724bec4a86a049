//! Static tool catalog.
//!
//! Schemas are advisory: enums, ranges and defaults are published to clients but never enforced
//! before the outbound call.

use crate::error::{Result, ServerError};
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use secdata_analytics::queries::Endpoint;
use serde_json::{Value, json};
use std::sync::Arc;

const EVENT_TYPES: &[&str] = &["dns", "http", "threat", "malware", "phishing", "botnet"];
const ACTIONS: &[&str] = &["allowed", "blocked"];
const INTERVALS: &[&str] = &["1m", "5m", "15m", "1h", "1d"];

/// One exposed tool: name, description, input schema, and the endpoint it maps to.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub endpoint: Endpoint,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolDescriptor {
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        let schema_obj = self
            .input_schema
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name, self.description, Arc::new(schema_obj));
        tool.annotations = Some(read_only_annotations());
        tool
    }
}

/// Every tool issues a single GET: read-only, idempotent, talks to an external system.
fn read_only_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    }
}

/// The fixed set of tools, with privacy-sensitive ones gated by configuration.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    privacy_tools_enabled: bool,
}

impl ToolCatalog {
    #[must_use]
    pub fn new(privacy_tools_enabled: bool) -> Self {
        Self {
            tools: descriptors(),
            privacy_tools_enabled,
        }
    }

    fn is_enabled(&self, descriptor: &ToolDescriptor) -> bool {
        self.privacy_tools_enabled || !descriptor.endpoint.is_privacy_sensitive()
    }

    /// Tools currently exposed to clients, in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().filter(|d| self.is_enabled(d))
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.enabled().map(ToolDescriptor::to_tool).collect()
    }

    /// Resolve a tool by exact name.
    ///
    /// # Errors
    ///
    /// - [`ServerError::UnknownOperation`] if no tool has this name
    /// - [`ServerError::ToolDisabled`] if the tool is privacy-sensitive and not enabled
    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor> {
        let descriptor = self
            .tools
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ServerError::UnknownOperation(name.to_string()))?;
        if !self.is_enabled(descriptor) {
            return Err(ServerError::ToolDisabled(name.to_string()));
        }
        Ok(descriptor)
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn string_enum(description: &str, values: &[&str]) -> Value {
    json!({ "type": "string", "description": description, "enum": values })
}

fn string_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn integer(description: &str, minimum: u32, maximum: u32, default: Option<u32>) -> Value {
    let mut schema = json!({
        "type": "integer",
        "description": description,
        "minimum": minimum,
        "maximum": maximum,
    });
    if let Some(default) = default {
        schema["default"] = json!(default);
    }
    schema
}

fn start_time() -> Value {
    string("Start of the time range (ISO 8601, e.g. 2024-01-01T00:00:00Z)")
}

fn end_time() -> Value {
    string("End of the time range (ISO 8601). Defaults to now")
}

fn interval() -> Value {
    string_enum("Bucket size for the timeline", INTERVALS)
}

#[allow(clippy::too_many_lines)]
fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "search_events",
            endpoint: Endpoint::SearchEvents,
            description: "Search security events (DNS queries, HTTP requests, threat detections) with optional filters.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "event_type": string_enum("Event type filter", EVENT_TYPES),
                    "domain": string("Domain filter (exact match)"),
                    "device_id": string_list("Restrict to these device IDs"),
                    "client_ip": string("Client IP address filter"),
                    "action": string_enum("Policy action filter", ACTIONS),
                    "category": string("Content or threat category filter"),
                    "limit": integer("Maximum number of events", 1, 1000, Some(50)),
                    "offset": integer("Number of events to skip", 0, 100_000, None),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_events_timeline",
            endpoint: Endpoint::EventsTimeline,
            description: "Get event counts over time, bucketed by interval.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "interval": interval(),
                    "event_type": string_enum("Event type filter", EVENT_TYPES),
                    "domain": string("Domain filter (exact match)"),
                    "device_id": string_list("Restrict to these device IDs"),
                    "action": string_enum("Policy action filter", ACTIONS),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_events_stats",
            endpoint: Endpoint::EventsStats,
            description: "Get aggregated event statistics (top domains, categories, devices, actions).",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "group_by": string_enum(
                        "Dimension to aggregate on",
                        &["domain", "category", "device", "action", "client_ip"],
                    ),
                    "event_type": string_enum("Event type filter", EVENT_TYPES),
                    "device_id": string_list("Restrict to these device IDs"),
                    "limit": integer("Number of top entries", 1, 100, Some(10)),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_dns_timeline",
            endpoint: Endpoint::DnsTimeline,
            description: "Get DNS query volume over time.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "interval": interval(),
                    "domain": string("Domain filter"),
                    "query_type": string_enum(
                        "DNS record type",
                        &["A", "AAAA", "CNAME", "MX", "NS", "PTR", "SOA", "SRV", "TXT"],
                    ),
                    "response_code": string_enum(
                        "DNS response code",
                        &["NOERROR", "NXDOMAIN", "SERVFAIL", "REFUSED"],
                    ),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_dnssec_timeline",
            endpoint: Endpoint::DnssecTimeline,
            description: "Get DNSSEC validation results over time.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "interval": interval(),
                    "domain": string("Domain filter"),
                    "validation_status": string_enum(
                        "DNSSEC validation outcome",
                        &["secure", "insecure", "bogus", "indeterminate"],
                    ),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_ioc_count",
            endpoint: Endpoint::IocCount,
            description: "Get the number of known indicators of compromise (IOCs) per category.",
            input_schema: object(json!({}), &[]),
        },
        ToolDescriptor {
            name: "get_resolver_metrics",
            endpoint: Endpoint::ResolverMetrics,
            description: "Get resolver performance metrics (latency, queries per second, cache hit ratio, error rate).",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "resolver_id": string_list("Restrict to these resolver IDs"),
                    "metric": string_enum(
                        "Metric to return",
                        &["latency", "qps", "cache_hit_ratio", "error_rate"],
                    ),
                    "interval": interval(),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "analyze_domain",
            endpoint: Endpoint::DomainAnalysis,
            description: "Analyze a domain for threats: reputation, categories, and recent activity.",
            input_schema: object(
                json!({
                    "fqdn": string("Fully qualified domain name to analyze (e.g. www.example.com)"),
                    "include_subdomains": {
                        "type": "boolean",
                        "description": "Include activity of subdomains",
                        "default": false
                    },
                    "lookback_days": integer("Days of history to consider", 1, 90, Some(30)),
                }),
                &["fqdn"],
            ),
        },
        ToolDescriptor {
            name: "get_audit_logs",
            endpoint: Endpoint::AuditLogs,
            description: "Get administrative audit log entries. Contains user identities; disabled unless privacy-sensitive tools are enabled.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "user": string("User (e-mail or ID) who performed the action"),
                    "action": string("Audited action (e.g. login, policy_update)"),
                    "resource_type": string("Type of the affected resource"),
                    "limit": integer("Maximum number of entries", 1, 1000, Some(50)),
                    "offset": integer("Number of entries to skip", 0, 100_000, None),
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_idp_incidents",
            endpoint: Endpoint::IdpIncidents,
            description: "Get identity-provider security incidents. Contains user identities; disabled unless privacy-sensitive tools are enabled.",
            input_schema: object(
                json!({
                    "start_time": start_time(),
                    "end_time": end_time(),
                    "severity": string_enum("Incident severity", &["low", "medium", "high", "critical"]),
                    "status": string_enum("Incident status", &["open", "resolved"]),
                    "user": string("Affected user (e-mail or ID)"),
                    "limit": integer("Maximum number of incidents", 1, 1000, Some(50)),
                    "offset": integer("Number of incidents to skip", 0, 100_000, None),
                }),
                &[],
            ),
        },
    ]
}
