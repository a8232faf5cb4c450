//! `list_azure_resources`: resource groups and their resources as markdown

use crate::azure::auth::acquire_credential;
use crate::azure::client::{format_tags, ManagementSession, Resource, ResourceGroup};
use crate::config::Config;
use crate::error::ToolError;
use futures::future;
use futures::TryStreamExt;
use serde::Deserialize;
use std::fmt::Write;

/// Arguments of `list_azure_resources`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourcesParams {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub resource_group_filter: Option<String>,
}

/// Case-insensitive substring filter on resource group names
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    needle: Option<String>,
}

impl GroupFilter {
    /// An absent or empty filter matches every group
    pub fn new(filter: Option<&str>) -> Self {
        Self {
            needle: filter.filter(|f| !f.is_empty()).map(str::to_lowercase),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.needle {
            Some(needle) => name.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

/// A resource group together with its member resources
pub struct GroupInventory {
    pub group: ResourceGroup,
    pub resources: Vec<Resource>,
}

/// List resource groups (optionally filtered) and the resources inside them
pub async fn list_azure_resources(
    config: &Config,
    params: &ListResourcesParams,
) -> Result<String, ToolError> {
    let credential = acquire_credential(config)?;
    let subscription_id = config
        .resolve_subscription(params.subscription_id.as_deref())
        .ok_or(ToolError::MissingSubscription)?;

    // Owned by this call; dropped on every return path below
    let session = ManagementSession::open(config, &credential, &subscription_id)
        .await
        .map_err(ToolError::Azure)?;

    let filter = GroupFilter::new(params.resource_group_filter.as_deref());
    let groups: Vec<ResourceGroup> = session
        .resource_groups()
        .try_filter(|group| future::ready(filter.matches(&group.name)))
        .try_collect()
        .await
        .map_err(ToolError::Azure)?;

    if groups.is_empty() {
        return Ok(no_groups_message(
            &subscription_id,
            params.resource_group_filter.as_deref(),
        ));
    }

    tracing::info!(
        "Found {} resource groups in subscription {}",
        groups.len(),
        subscription_id
    );

    let mut inventory = Vec::with_capacity(groups.len());
    for group in groups {
        let resources: Vec<Resource> = session
            .resources_in_group(&group.name)
            .try_collect()
            .await
            .map_err(ToolError::Azure)?;
        tracing::debug!("{}: {} resources", group.name, resources.len());
        inventory.push(GroupInventory { group, resources });
    }

    Ok(render_inventory(session.subscription_id(), &inventory))
}

/// Message for a subscription with no (matching) resource groups
pub fn no_groups_message(subscription_id: &str, filter: Option<&str>) -> String {
    let mut message = format!("No resource groups found in subscription '{}'", subscription_id);
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        let _ = write!(message, " matching filter '{}'", filter);
    }
    message
}

/// Render the inventory report
pub fn render_inventory(subscription_id: &str, inventory: &[GroupInventory]) -> String {
    let mut out = format!("## Azure Resources in Subscription '{}'\n\n", subscription_id);

    for GroupInventory { group, resources } in inventory {
        let _ = write!(out, "### Resource Group: {}\n\n", group.name);
        let _ = writeln!(out, "- **Location**: {}", group.location);
        if let Some(tags) = group.tags.as_ref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "- **Tags**: {}", format_tags(tags));
        }

        out.push_str("\n**Resources:**\n\n");

        for resource in resources {
            let _ = writeln!(out, "- **{}**", resource.name);
            let _ = writeln!(out, "  - **Type**: {}", resource.resource_type);
            let _ = writeln!(out, "  - **Location**: {}", resource.location);
            if let Some(tags) = resource.tags.as_ref().filter(|t| !t.is_empty()) {
                let _ = writeln!(out, "  - **Tags**: {}", format_tags(tags));
            }
            out.push('\n');
        }

        if resources.is_empty() {
            out.push_str("No resources found in this resource group.\n\n");
        }

        out.push_str("---\n\n");
    }

    out
}
