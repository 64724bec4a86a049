//! Typed query records, one per analytics endpoint.
//!
//! Field declaration order is the order in which query parameters are emitted. `None` fields are
//! never sent. Scalar fields accept a JSON string, number or boolean and keep its string form;
//! list fields also accept a single scalar.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Analytics API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SearchEvents,
    EventsTimeline,
    EventsStats,
    DnsTimeline,
    DnssecTimeline,
    IocCount,
    ResolverMetrics,
    DomainAnalysis,
    AuditLogs,
    IdpIncidents,
}

impl Endpoint {
    pub const ALL: [Self; 10] = [
        Self::SearchEvents,
        Self::EventsTimeline,
        Self::EventsStats,
        Self::DnsTimeline,
        Self::DnssecTimeline,
        Self::IocCount,
        Self::ResolverMetrics,
        Self::DomainAnalysis,
        Self::AuditLogs,
        Self::IdpIncidents,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::SearchEvents => "/events/search",
            Self::EventsTimeline => "/events/timeline",
            Self::EventsStats => "/events/stats",
            Self::DnsTimeline => "/dns/timeline",
            Self::DnssecTimeline => "/dnssec/timeline",
            Self::IocCount => "/ioc/count",
            Self::ResolverMetrics => "/resolver/metrics",
            Self::DomainAnalysis => "/domain/analysis",
            Self::AuditLogs => "/audit/logs",
            Self::IdpIncidents => "/idp/incidents",
        }
    }

    /// Endpoints that expose per-user data.
    #[must_use]
    pub fn is_privacy_sensitive(self) -> bool {
        matches!(self, Self::AuditLogs | Self::IdpIncidents)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchEventsQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub device_id: Option<Vec<String>>,
    #[serde(deserialize_with = "scalar")]
    pub client_ip: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub action: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub category: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub limit: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsTimelineQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub interval: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub device_id: Option<Vec<String>>,
    #[serde(deserialize_with = "scalar")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsStatsQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub group_by: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub device_id: Option<Vec<String>>,
    #[serde(deserialize_with = "scalar")]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsTimelineQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub interval: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub query_type: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub response_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnssecTimelineQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub interval: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub validation_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverMetricsQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub resolver_id: Option<Vec<String>>,
    #[serde(deserialize_with = "scalar")]
    pub metric: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub interval: Option<String>,
}

/// Domain threat analysis. `fqdn` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAnalysisQuery {
    pub fqdn: String,
    pub include_subdomains: Option<String>,
    pub lookback_days: Option<String>,
}

impl DomainAnalysisQuery {
    #[must_use]
    pub fn new(fqdn: impl Into<String>) -> Self {
        Self {
            fqdn: fqdn.into(),
            include_subdomains: None,
            lookback_days: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLogsQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub user: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub action: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub resource_type: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub limit: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpIncidentsQuery {
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub severity: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub status: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub user: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub limit: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub offset: Option<String>,
}

/// Accept `null`, a string, a number, or a boolean, keeping the value's string form.
///
/// Numbers keep their JSON spelling (`50.0` stays `"50.0"`). Range and enum constraints are left
/// to the analytics API.
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_string(value).map(Some).map_err(D::Error::custom),
    }
}

/// Accept `null`, a single scalar, or an array of scalars.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(scalar_string)
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(D::Error::custom),
        Some(value) => scalar_string(value)
            .map(|s| Some(vec![s]))
            .map_err(D::Error::custom),
    }
}

fn scalar_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!(
            "expected a string, number or boolean, got {}",
            kind(&other)
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_paths_are_unique() {
        let mut paths: Vec<&str> = Endpoint::ALL.iter().map(|e| e.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Endpoint::ALL.len());
    }

    #[test]
    fn only_audit_and_idp_are_privacy_sensitive() {
        let sensitive: Vec<Endpoint> = Endpoint::ALL
            .into_iter()
            .filter(|e| e.is_privacy_sensitive())
            .collect();
        assert_eq!(sensitive, vec![Endpoint::AuditLogs, Endpoint::IdpIncidents]);
    }

    #[test]
    fn list_fields_accept_single_string_or_array() {
        let q: SearchEventsQuery = serde_json::from_value(json!({ "device_id": "d1" })).unwrap();
        assert_eq!(q.device_id, Some(vec!["d1".to_string()]));

        let q: SearchEventsQuery =
            serde_json::from_value(json!({ "device_id": ["d1", "d2"] })).unwrap();
        assert_eq!(q.device_id, Some(vec!["d1".to_string(), "d2".to_string()]));

        let q: SearchEventsQuery = serde_json::from_value(json!({ "device_id": null })).unwrap();
        assert_eq!(q.device_id, None);

        let q: SearchEventsQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(q, SearchEventsQuery::default());
    }

    #[test]
    fn scalar_fields_keep_the_string_form_of_any_json_scalar() {
        let q: SearchEventsQuery = serde_json::from_value(json!({
            "start_time": 1_704_067_200,
            "limit": 50.0,
            "offset": "10",
            "domain": "example.com",
        }))
        .unwrap();
        assert_eq!(q.start_time.as_deref(), Some("1704067200"));
        assert_eq!(q.limit.as_deref(), Some("50.0"));
        assert_eq!(q.offset.as_deref(), Some("10"));
        assert_eq!(q.domain.as_deref(), Some("example.com"));

        let q: IdpIncidentsQuery =
            serde_json::from_value(json!({ "severity": true, "user": null })).unwrap();
        assert_eq!(q.severity.as_deref(), Some("true"));
        assert_eq!(q.user, None);
    }

    #[test]
    fn list_fields_accept_scalar_items() {
        let q: ResolverMetricsQuery =
            serde_json::from_value(json!({ "resolver_id": [1, "r2", null] })).unwrap();
        assert_eq!(q.resolver_id, Some(vec!["1".to_string(), "r2".to_string()]));

        let q: EventsStatsQuery = serde_json::from_value(json!({ "device_id": 7 })).unwrap();
        assert_eq!(q.device_id, Some(vec!["7".to_string()]));
    }

    #[test]
    fn structured_values_are_rejected() {
        let err = serde_json::from_value::<SearchEventsQuery>(json!({ "limit": { "max": 5 } }))
            .unwrap_err();
        assert!(err.to_string().contains("an object"), "{err}");

        assert!(
            serde_json::from_value::<EventsTimelineQuery>(json!({ "device_id": [["a"]] }))
                .is_err()
        );
    }

    #[test]
    fn serialization_keeps_declaration_order() {
        let q = SearchEventsQuery {
            domain: Some("example.com".into()),
            device_id: Some(vec!["a".into(), "b".into()]),
            ..SearchEventsQuery::default()
        };
        let v = serde_json::to_value(&q).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "start_time");
        let domain_pos = keys.iter().position(|k| *k == "domain").unwrap();
        let device_pos = keys.iter().position(|k| *k == "device_id").unwrap();
        assert!(domain_pos < device_pos);
    }
}
