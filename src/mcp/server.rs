//! MCP server on `rmcp`
//!
//! stdout is reserved for protocol messages; everything else goes through
//! `tracing`.

use super::transport;
use crate::config::Config;
use crate::tools::{AzureTool, ToolOutput};
use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

pub const SERVER_NAME: &str = "azure-resource-mcp";

/// MCP tool server
pub struct McpServer {
    config: Config,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serve on stdin/stdout until stdin closes
    pub async fn serve_stdio(self) -> Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one client session over any byte transport
    pub async fn run<R, W>(self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (reader, writer, relay) = transport::screened(input, output);

        match self.serve((reader, writer)).await {
            Ok(service) => {
                let reason = service.waiting().await.context("MCP service task failed")?;
                tracing::info!("MCP session ended: {:?}", reason);
            }
            Err(e) => tracing::warn!("MCP session did not start: {}", e),
        }

        relay.finish().await
    }

    /// Run a tool by name
    pub async fn call_tool_by_name(&self, name: &str, arguments: Value) -> ToolOutput {
        match AzureTool::from_name(name) {
            Some(tool) => tool.call(&self.config, arguments).await,
            None => {
                tracing::warn!("Unknown tool requested: {}", name);
                ToolOutput::error(format!("Unknown tool: {}", name))
            }
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Read-only Azure tools: list_azure_resources reports resource groups and \
                 their resources, get_azure_costs reports daily actual cost."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: tools_list(),
            meta: None,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        Ok(self.call_tool_by_name(&request.name, arguments).await.into())
    }
}

/// Tool descriptors for `tools/list`
pub fn tools_list() -> Vec<Tool> {
    AzureTool::ALL.iter().map(|tool| tool.descriptor()).collect()
}
