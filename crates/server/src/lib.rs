//! MCP stdio server for the secdata analytics API.
//!
//! Protocol handling lives here; request building and response shaping live in
//! `secdata-analytics`.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod stdio;

pub use catalog::ToolCatalog;
pub use dispatch::ToolDispatcher;
pub use error::{Result, ServerError};
