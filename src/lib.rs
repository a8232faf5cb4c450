//! Azure resource inventory and cost queries exposed as MCP tools.
//!
//! - [`config`] - environment-sourced settings
//! - [`azure`] - authentication and REST plumbing
//! - [`tools`] - the `list_azure_resources` and `get_azure_costs` handlers
//! - [`mcp`] - `rmcp` server over stdio

pub mod azure;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;

/// Reported as `serverInfo.version` during the MCP handshake
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
