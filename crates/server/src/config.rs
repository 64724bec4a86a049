//! Process configuration (CLI flags with environment fallbacks) and logging setup.

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use secdata_analytics::config::{
    ApiConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_MAX_RESULTS, Settings,
    ShapingConfig,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// secdata MCP server: analytics queries as MCP tools over stdio.
#[derive(Debug, Clone, Parser)]
#[command(name = "secdata-mcp", version, about)]
pub struct Cli {
    /// Analytics API access key.
    #[arg(long, env = "SECDATA_ACCESS_KEY", default_value = "", hide_env_values = true)]
    pub access_key: String,

    /// Analytics API secret key.
    #[arg(long, env = "SECDATA_SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,

    /// Analytics API base URL.
    #[arg(long, env = "SECDATA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum number of items returned from a list response.
    #[arg(long, env = "SECDATA_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS, value_parser = parse_positive)]
    pub max_results: usize,

    /// Maximum serialized response size, in characters.
    #[arg(long, env = "SECDATA_MAX_RESPONSE_SIZE", default_value_t = DEFAULT_MAX_RESPONSE_SIZE, value_parser = parse_positive)]
    pub max_response_size: usize,

    /// Shorten long strings and enforce the response size limit.
    #[arg(
        long,
        env = "SECDATA_ENABLE_TRUNCATION",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_truncation: bool,

    /// Expose tools that return per-user data (audit logs, identity incidents).
    #[arg(
        long,
        env = "SECDATA_ENABLE_PRIVACY_TOOLS",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_privacy_tools: bool,

    /// Per-request timeout in seconds (0 or unset = no explicit timeout).
    #[arg(long, env = "SECDATA_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Log level filter (overridden by `RUST_LOG`).
    #[arg(long, env = "SECDATA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (logs always go to stderr).
    #[arg(long, env = "SECDATA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn settings(&self) -> Settings {
        let request_timeout = self
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Settings {
            api: ApiConfig::new(self.base_url.clone())
                .with_credentials(self.access_key.clone(), self.secret_key.clone())
                .with_request_timeout(request_timeout),
            shaping: ShapingConfig {
                max_results: self.max_results,
                max_response_size: self.max_response_size,
                enable_truncation: self.enable_truncation,
            },
        }
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|e| format!("'{s}' is not a valid number: {e}"))?;
    if n == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(n)
}

/// Install the global tracing subscriber.
///
/// Stdout carries the MCP protocol, so logs are written to stderr.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
