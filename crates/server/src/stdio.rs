//! MCP over stdio: JSON-RPC 2.0, one JSON message per line.
//!
//! Requests are handled strictly in arrival order; a request completes before the next line is read.

use crate::dispatch::ToolDispatcher;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _, BufReader};
use tracing::{debug, info, warn};

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "secdata-mcp";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

const INSTRUCTIONS: &str = "Read-only access to security analytics: DNS and security events, \
timelines, statistics, resolver metrics, IoC counts and domain threat analysis. Responses are \
bounded in item count, string length and total size; narrow time ranges or add filters when a \
result is truncated.";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve MCP on the process stdin/stdout until stdin is closed.
///
/// # Errors
///
/// Returns an error if reading stdin or writing stdout fails.
pub async fn serve_stdio(dispatcher: &ToolDispatcher) -> io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(dispatcher, stdin, stdout).await
}

/// Serve MCP over an arbitrary line-oriented reader/writer pair.
///
/// A line that is not valid UTF-8 gets a parse error reply; the loop keeps going.
///
/// # Errors
///
/// Returns an error if reading from `reader` or writing to `writer` fails.
pub async fn serve<R, W>(dispatcher: &ToolDispatcher, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let response = match std::str::from_utf8(&buf) {
            Ok(line) => handle_line(dispatcher, line).await,
            Err(e) => {
                warn!(error = %e, "non UTF-8 input line");
                Some(jsonrpc_err(
                    &Value::Null,
                    PARSE_ERROR,
                    &format!("parse error: {e}"),
                ))
            }
        };
        if let Some(response) = response {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    info!("stdin closed");
    Ok(())
}

/// Handle one raw input line. Returns `None` when nothing should be written back.
pub async fn handle_line(dispatcher: &ToolDispatcher, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(msg) => handle_message(dispatcher, &msg).await,
        Err(e) => {
            warn!(error = %e, "unparsable JSON-RPC message");
            Some(jsonrpc_err(
                &Value::Null,
                PARSE_ERROR,
                &format!("parse error: {e}"),
            ))
        }
    }
}

async fn handle_message(dispatcher: &ToolDispatcher, msg: &Value) -> Option<Value> {
    // Notifications (no `id`) never get a response.
    let id = msg.get("id")?.clone();

    let Some(method) = msg.get("method").and_then(Value::as_str) else {
        return Some(jsonrpc_err(&id, INVALID_REQUEST, "invalid request: missing method"));
    };
    debug!(method, "request");

    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    let response = match method {
        "initialize" => jsonrpc_ok(&id, initialize_result(&params)),
        "ping" => jsonrpc_ok(&id, json!({})),
        "tools/list" => reply(
            &id,
            serde_json::to_value(dispatcher.list_tools()).map(|tools| json!({ "tools": tools })),
        ),
        "tools/call" => match serde_json::from_value::<CallToolParams>(params) {
            Ok(call) => {
                let result = dispatcher.call_tool(&call.name, call.arguments).await;
                reply(&id, serde_json::to_value(&result))
            }
            Err(e) => jsonrpc_err(&id, INVALID_PARAMS, &format!("invalid params: {e}")),
        },
        "resources/list" => jsonrpc_ok(&id, json!({ "resources": [] })),
        "prompts/list" => jsonrpc_ok(&id, json!({ "prompts": [] })),
        other => jsonrpc_err(&id, METHOD_NOT_FOUND, &format!("method not found: {other}")),
    };
    Some(response)
}

fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": INSTRUCTIONS,
    })
}

/// A result that failed to serialize is a server-side fault, not a bad request.
fn reply(id: &Value, result: serde_json::Result<Value>) -> Value {
    match result {
        Ok(result) => jsonrpc_ok(id, result),
        Err(e) => {
            warn!(error = %e, "failed to serialize result");
            jsonrpc_err(id, INTERNAL_ERROR, &format!("internal error: {e}"))
        }
    }
}

fn jsonrpc_ok(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn jsonrpc_err(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
