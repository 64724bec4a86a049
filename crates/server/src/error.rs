//! Error types for the MCP server.

use secdata_analytics::GatewayError;
use thiserror::Error;

/// Main error type for tool dispatch.
#[derive(Error, Debug)]
pub enum ServerError {
    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// The tool exists but is switched off by configuration.
    #[error("Tool '{0}' is disabled (set SECDATA_ENABLE_PRIVACY_TOOLS=true to enable it)")]
    ToolDisabled(String),

    /// A required argument was absent, null, or blank.
    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    MissingRequiredParameter {
        tool: String,
        parameter: &'static str,
    },

    /// The argument bag, or one of its fields, had an unusable JSON shape.
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// Gateway failures (remote status, malformed body, transport).
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
