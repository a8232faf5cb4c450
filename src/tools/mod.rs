//! Tool catalogue
//!
//! Each tool is a plain async handler returning `Result<String, ToolError>`.
//! [`AzureTool::call`] is the boundary: it parses arguments, runs the
//! handler and turns any error into text, so callers only ever see a
//! [`ToolOutput`].

pub mod costs;
pub mod inventory;

use crate::config::Config;
use crate::error::ToolError;
use rmcp::model::{object, CallToolResult, Content, JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub use costs::{get_azure_costs, CostParams};
pub use inventory::{list_azure_resources, ListResourcesParams};

/// Tools exposed to the MCP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzureTool {
    ListResources,
    GetCosts,
}

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: String) -> Self {
        Self { text, is_error: false }
    }

    pub fn error(text: String) -> Self {
        Self { text, is_error: true }
    }
}

impl From<ToolOutput> for CallToolResult {
    fn from(output: ToolOutput) -> Self {
        let content = vec![Content::text(output.text)];
        if output.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

impl AzureTool {
    pub const ALL: [AzureTool; 2] = [AzureTool::ListResources, AzureTool::GetCosts];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            AzureTool::ListResources => "list_azure_resources",
            AzureTool::GetCosts => "get_azure_costs",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AzureTool::ListResources => {
                "List Azure resource groups and the resources inside them using service principal \
                 authentication. Returns a markdown report."
            }
            AzureTool::GetCosts => {
                "Get daily actual cost for an Azure subscription from the Cost Management API. \
                 Returns a markdown table with a total."
            }
        }
    }

    /// Prefix for errors that fit no other category
    fn error_context(self) -> &'static str {
        match self {
            AzureTool::ListResources => "Error listing Azure resources",
            AzureTool::GetCosts => "Error retrieving Azure costs via REST API",
        }
    }

    /// JSON Schema of the tool arguments
    pub fn input_schema(self) -> JsonObject {
        let subscription = json!({
            "type": "string",
            "description": "Subscription ID to query. Defaults to AZURE_SUBSCRIPTION_ID."
        });

        object(match self {
            AzureTool::ListResources => json!({
                "type": "object",
                "properties": {
                    "subscription_id": subscription,
                    "resource_group_filter": {
                        "type": "string",
                        "description": "Only include resource groups whose name contains this text (case-insensitive)."
                    }
                }
            }),
            AzureTool::GetCosts => json!({
                "type": "object",
                "properties": {
                    "subscription_id": subscription,
                    "timeframe": {
                        "type": "string",
                        "description": "Cost Management timeframe, e.g. MonthToDate, BillingMonthToDate, TheLastMonth, WeekToDate.",
                        "default": costs::DEFAULT_TIMEFRAME
                    }
                }
            }),
        })
    }

    /// Entry for `tools/list`
    pub fn descriptor(self) -> Tool {
        Tool::new(self.name(), self.description(), self.input_schema())
    }

    /// Run the tool. Never fails: errors come back as text with `is_error` set.
    pub async fn call(self, config: &Config, arguments: Value) -> ToolOutput {
        tracing::info!("Calling tool {}", self.name());

        let result = match self {
            AzureTool::ListResources => match parse_arguments::<ListResourcesParams>(arguments) {
                Ok(params) => list_azure_resources(config, &params).await,
                Err(text) => return ToolOutput::error(text),
            },
            AzureTool::GetCosts => match parse_arguments::<CostParams>(arguments) {
                Ok(params) => get_azure_costs(config, &params).await,
                Err(text) => return ToolOutput::error(text),
            },
        };

        self.into_output(result)
    }

    fn into_output(self, result: Result<String, ToolError>) -> ToolOutput {
        match result {
            Ok(text) => ToolOutput::success(text),
            Err(e) => {
                tracing::error!("{} failed: {}", self.name(), e);
                ToolOutput::error(e.to_tool_text(self.error_context()))
            }
        }
    }
}

/// Missing or `null` arguments mean "all defaults"
fn parse_arguments<T: DeserializeOwned + Default>(arguments: Value) -> Result<T, String> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))
}
