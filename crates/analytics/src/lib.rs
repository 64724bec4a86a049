//! Analytics API gateway + response shaping.
//!
//! This crate owns everything between a typed query and a size-bounded JSON value:
//! - request construction and the single outbound GET ([`runtime`])
//! - size control of upstream payloads ([`response_shaping`])
//!
//! It contains **no** MCP protocol handling; see `secdata-mcp` for that.

pub mod config;
pub mod error;
pub mod queries;
pub mod response_shaping;
pub mod runtime;
pub mod safety;

pub use config::{ApiConfig, Settings, ShapingConfig};
pub use error::{GatewayError, Result};
pub use response_shaping::ResponseShaper;
pub use runtime::AnalyticsGateway;
