//! Tool boundary errors
//!
//! Handlers return typed errors; [`ToolError::to_tool_text`] is the single
//! place where they become the human-readable text the MCP client sees.

use thiserror::Error;

/// Missing or unusable configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Missing Azure service principal credentials ({}). Please set AZURE_TENANT_ID, AZURE_CLIENT_ID, and AZURE_CLIENT_SECRET environment variables.",
        .0.join(", ")
    )]
    MissingCredentials(Vec<&'static str>),
}

/// Failure of a tool handler
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("No subscription ID provided or found in AZURE_SUBSCRIPTION_ID environment variable.")]
    MissingSubscription,

    /// Token endpoint or Resource Manager failure
    #[error("{0:#}")]
    Azure(anyhow::Error),

    /// Cost Management answered with a non-200 status
    #[error("Status {status}, Details: {body}")]
    CostApi { status: u16, body: String },

    #[error("{0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl ToolError {
    /// Render the error as tool output. `context` prefixes errors that
    /// fall into no other category, e.g. "Error listing Azure resources".
    pub fn to_tool_text(&self, context: &str) -> String {
        match self {
            ToolError::Configuration(e) => format!("Configuration Error: {}", e),
            ToolError::MissingSubscription => format!("Error: {}", self),
            ToolError::Azure(_) => format!("Azure Error: {}", self),
            ToolError::CostApi { .. } => format!("Error from Azure API: {}", self),
            ToolError::Unexpected(_) => format!("{}: {}", context, self),
        }
    }
}
