use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use secdata_analytics::config::{ApiConfig, ShapingConfig};
use secdata_analytics::{AnalyticsGateway, ResponseShaper};
use secdata_mcp::{ToolCatalog, ToolDispatcher, stdio};
use secdata_test_support::{MockApi, echo_router};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn dispatcher(base_url: &str, shaping: ShapingConfig, privacy: bool) -> ToolDispatcher {
    let api = ApiConfig::new(base_url).with_credentials("ak-int", "sk-int");
    let gateway =
        AnalyticsGateway::new(api, ResponseShaper::new(shaping)).expect("valid gateway config");
    ToolDispatcher::new(gateway, ToolCatalog::new(privacy))
}

/// Feed `requests` through the stdio loop and collect every response line.
async fn run_session(dispatcher: &ToolDispatcher, requests: &[Value]) -> anyhow::Result<Vec<Value>> {
    let mut input = String::new();
    for req in requests {
        input.push_str(&serde_json::to_string(req)?);
        input.push('\n');
    }

    let mut output: Vec<u8> = Vec::new();
    stdio::serve(dispatcher, input.as_bytes(), &mut output).await?;

    String::from_utf8(output)?
        .lines()
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}

fn call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments },
    })
}

fn tool_text(resp: &Value) -> &str {
    resp["result"]["content"][0]["text"]
        .as_str()
        .expect("text content")
}

fn tool_json(resp: &Value) -> Value {
    serde_json::from_str(tool_text(resp)).expect("tool text is JSON")
}

#[tokio::test]
async fn full_session_over_stdio() -> anyhow::Result<()> {
    let api = MockApi::start(echo_router()).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let responses = run_session(
        &d,
        &[
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": { "protocolVersion": "2024-11-05", "capabilities": {},
                                "clientInfo": { "name": "it", "version": "0" } } }),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
            call(3, "get_ioc_count", json!({})),
        ],
    )
    .await?;

    // The notification produces no output.
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], json!("secdata-mcp"));
    assert_eq!(responses[1]["result"]["tools"].as_array().map(Vec::len), Some(8));

    assert_eq!(responses[2]["id"], json!(3));
    assert_ne!(responses[2]["result"]["isError"], json!(true));
    let echoed = tool_json(&responses[2]);
    assert_eq!(echoed["method"], json!("GET"));
    assert_eq!(echoed["path"], json!("/ioc/count"));
    assert_eq!(echoed["query"], json!(""));
    assert_eq!(echoed["access_key"], json!("ak-int"));
    assert_eq!(echoed["secret_key"], json!("sk-int"));
    assert_eq!(echoed["content_type"], json!("application/json"));
    Ok(())
}

#[tokio::test]
async fn query_parameters_follow_arguments() -> anyhow::Result<()> {
    let api = MockApi::start(echo_router()).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let responses = run_session(
        &d,
        &[call(
            1,
            "search_events",
            json!({ "domain": "bad.example", "device_id": ["d1", "d2"], "limit": 10, "event_type": null }),
        )],
    )
    .await?;

    let echoed = tool_json(&responses[0]);
    assert_eq!(echoed["path"], json!("/events/search"));
    assert_eq!(
        echoed["query"],
        json!("domain=bad.example&device_id=d1&device_id=d2&limit=10")
    );
    Ok(())
}

#[tokio::test]
async fn missing_fqdn_never_reaches_the_api() -> anyhow::Result<()> {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/domain/analysis",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                axum::Json(json!({ "risk": "low" }))
            }),
        )
        .with_state(Arc::clone(&hits));
    let api = MockApi::start(app).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let responses = run_session(
        &d,
        &[
            call(1, "analyze_domain", json!({ "lookback_days": 3 })),
            call(2, "analyze_domain", json!({ "fqdn": "evil.example.com" })),
        ],
    )
    .await?;

    assert_eq!(responses[0]["result"]["isError"], json!(true));
    assert!(tool_text(&responses[0]).contains("Missing required parameter 'fqdn'"));
    assert_eq!(tool_json(&responses[1]), json!({ "risk": "low" }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn remote_failures_become_tool_errors() -> anyhow::Result<()> {
    let app = Router::new()
        .route(
            "/events/stats",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route(
            "/dns/timeline",
            get(|| async { (StatusCode::PAYLOAD_TOO_LARGE, "") }),
        );
    let api = MockApi::start(app).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let responses = run_session(
        &d,
        &[
            call(1, "get_events_stats", json!({})),
            call(2, "get_dns_timeline", json!({ "interval": "1h" })),
            call(3, "no_such_tool", json!({})),
        ],
    )
    .await?;

    assert_eq!(responses.len(), 3);
    for resp in &responses {
        assert!(resp.get("error").is_none(), "tool failures are not protocol errors");
        assert_eq!(resp["result"]["isError"], json!(true));
    }

    let text = tool_text(&responses[0]);
    assert!(text.starts_with("Error: Remote API error: 503"), "{text}");
    assert!(text.contains("maintenance"));
    assert!(!text.contains("Hint"));

    let text = tool_text(&responses[1]);
    assert!(text.contains("413"), "{text}");
    assert!(text.contains("Hint: use more specific filters"), "{text}");

    assert_eq!(tool_text(&responses[2]), "Error: Unknown tool: no_such_tool");
    Ok(())
}

#[tokio::test]
async fn privacy_tools_follow_configuration() -> anyhow::Result<()> {
    let api = MockApi::start(echo_router()).await?;

    let off = dispatcher(api.base_url(), ShapingConfig::default(), false);
    let responses = run_session(&off, &[call(1, "get_audit_logs", json!({}))]).await?;
    assert_eq!(responses[0]["result"]["isError"], json!(true));
    assert!(tool_text(&responses[0]).contains("get_audit_logs"));

    let on = dispatcher(api.base_url(), ShapingConfig::default(), true);
    let responses = run_session(
        &on,
        &[call(1, "get_audit_logs", json!({ "user": "alice@example.com" }))],
    )
    .await?;
    let echoed = tool_json(&responses[0]);
    assert_eq!(echoed["path"], json!("/audit/logs"));
    assert_eq!(echoed["query"], json!("user=alice%40example.com"));
    Ok(())
}

#[tokio::test]
async fn large_list_responses_are_wrapped() -> anyhow::Result<()> {
    let rows: Vec<Value> = (0..120)
        .map(|i| json!({ "id": i, "domain": format!("host{i}.example") }))
        .collect();
    let app = Router::new().route(
        "/events/search",
        get(move || {
            let rows = rows.clone();
            async move { axum::Json(Value::Array(rows)) }
        }),
    );
    let api = MockApi::start(app).await?;
    let shaping = ShapingConfig {
        max_results: 10,
        ..ShapingConfig::default()
    };
    let d = dispatcher(api.base_url(), shaping, false);

    let responses = run_session(&d, &[call(1, "search_events", json!({}))]).await?;
    let body = tool_json(&responses[0]);
    assert_eq!(body["total_available"], json!(120));
    assert_eq!(body["returned"], json!(10));
    assert_eq!(body["truncated"], json!(true));
    assert_eq!(body["results"].as_array().map(Vec::len), Some(10));
    assert_eq!(body["results"][0]["id"], json!(0));
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_line_does_not_end_the_session() -> anyhow::Result<()> {
    let api = MockApi::start(echo_router()).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let mut input = Vec::new();
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
    input.extend_from_slice(b"\xff\xfe\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

    let mut output: Vec<u8> = Vec::new();
    stdio::serve(&d, input.as_slice(), &mut output).await?;

    let responses: Vec<Value> = String::from_utf8(output)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0], json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
    assert_eq!(responses[1]["id"], Value::Null);
    assert_eq!(responses[1]["error"]["code"], json!(-32700));
    assert_eq!(responses[2], json!({ "jsonrpc": "2.0", "id": 2, "result": {} }));
    Ok(())
}

#[tokio::test]
async fn scalar_arguments_of_any_json_type_reach_the_api() -> anyhow::Result<()> {
    let api = MockApi::start(echo_router()).await?;
    let d = dispatcher(api.base_url(), ShapingConfig::default(), false);

    let responses = run_session(
        &d,
        &[
            call(1, "search_events", json!({ "start_time": 1_704_067_200, "limit": 50.0 })),
            call(2, "get_events_stats", json!({ "limit": "10" })),
            call(
                3,
                "analyze_domain",
                json!({ "fqdn": "evil.example.com", "include_subdomains": "true", "lookback_days": 7 }),
            ),
        ],
    )
    .await?;

    for resp in &responses {
        assert_ne!(resp["result"]["isError"], json!(true), "{resp}");
    }
    assert_eq!(
        tool_json(&responses[0])["query"],
        json!("start_time=1704067200&limit=50.0")
    );
    assert_eq!(tool_json(&responses[1])["query"], json!("limit=10"));
    assert_eq!(
        tool_json(&responses[2])["query"],
        json!("fqdn=evil.example.com&include_subdomains=true&lookback_days=7")
    );
    Ok(())
}
