//! Azure Resource Manager session
//!
//! A session is scoped to one (credential, subscription) pair and lives for
//! a single tool call. Dropping it releases the underlying connection pool.

use super::auth::{AccessToken, ServicePrincipal, MANAGEMENT_SCOPE};
use super::http::AzureHttpClient;
use crate::config::Config;
use anyhow::{Context, Result};
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// API version for resource group and resource listing
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// API version for Cost Management queries
pub const COST_MANAGEMENT_API_VERSION: &str = "2022-10-01";

/// Resource group as returned by ARM
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Option<Map<String, Value>>,
}

/// Resource as returned by ARM
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Option<Map<String, Value>>,
}

/// One page of an ARM list response
#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

/// Authenticated Resource Manager session for one subscription
pub struct ManagementSession {
    http: AzureHttpClient,
    token: AccessToken,
    base_url: String,
    subscription_id: String,
}

impl ManagementSession {
    /// Authenticate and open a session scoped to `subscription_id`
    pub async fn open(
        config: &Config,
        credential: &ServicePrincipal,
        subscription_id: &str,
    ) -> Result<Self> {
        let http = AzureHttpClient::new()?;
        let token = credential
            .get_token(&http, &config.authority_host, MANAGEMENT_SCOPE)
            .await?;

        tracing::info!("Opened management session for subscription {}", subscription_id);

        Ok(Self {
            http,
            token,
            base_url: config.resource_manager_url.clone(),
            subscription_id: subscription_id.to_string(),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub(crate) fn http(&self) -> &AzureHttpClient {
        &self.http
    }

    pub(crate) fn bearer_token(&self) -> &str {
        &self.token.token
    }

    /// Build a subscription-scoped ARM URL
    pub fn subscription_url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}?api-version={}",
            self.base_url,
            urlencoding::encode(&self.subscription_id),
            path.trim_start_matches('/'),
            api_version
        )
    }

    /// Lazily enumerate resource groups, in the order ARM returns them
    pub fn resource_groups(&self) -> impl Stream<Item = Result<ResourceGroup>> + '_ {
        let url = self.subscription_url("resourcegroups", RESOURCES_API_VERSION);
        self.paginate("resource groups", url)
    }

    /// Lazily enumerate resources in one resource group
    pub fn resources_in_group<'a>(
        &'a self,
        group_name: &str,
    ) -> impl Stream<Item = Result<Resource>> + 'a {
        let path = format!("resourceGroups/{}/resources", urlencoding::encode(group_name));
        let url = self.subscription_url(&path, RESOURCES_API_VERSION);
        self.paginate("resources", url)
    }

    /// Follow `nextLink` until the service stops returning a new one
    fn paginate<T>(
        &self,
        collection: &'static str,
        first_url: String,
    ) -> impl Stream<Item = Result<T>> + '_
    where
        T: DeserializeOwned + 'static,
    {
        stream::try_unfold(Some(first_url), move |next| {
            self.next_page::<T>(collection, next)
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, anyhow::Error>)))
        .try_flatten()
    }

    /// Fetch one page; `None` once pagination is exhausted
    async fn next_page<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        next: Option<String>,
    ) -> Result<Option<(Vec<T>, Option<String>)>> {
        let Some(url) = next else {
            return Ok(None);
        };

        let page: Page<T> = self
            .http
            .get_json(&url, &self.token.token)
            .await
            .with_context(|| format!("Failed to list {}", collection))?;

        tracing::debug!("Fetched page of {} with {} items", collection, page.value.len());

        Ok(Some((page.value, follow_link(collection, &url, page.next_link))))
    }
}

/// Next page to fetch; a link back to the page just fetched ends pagination
fn follow_link(collection: &str, current: &str, next_link: Option<String>) -> Option<String> {
    let next_link = next_link.filter(|link| !link.is_empty())?;
    if next_link == current {
        tracing::warn!("{} page links back to itself, stopping pagination", collection);
        return None;
    }
    Some(next_link)
}

/// Render tags as `k=v` pairs joined by ", "
pub fn format_tags(tags: &Map<String, Value>) -> String {
    tags.iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{}={}", k, s),
            Value::Null => format!("{}=", k),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_group_deserializes_without_tags() {
        let group: ResourceGroup =
            serde_json::from_value(json!({"name": "rg-1", "location": "westeurope"})).unwrap();
        assert_eq!(group.name, "rg-1");
        assert!(group.tags.is_none());
    }

    #[test]
    fn test_resource_type_field_is_renamed() {
        let resource: Resource = serde_json::from_value(json!({
            "name": "vm-1",
            "type": "Microsoft.Compute/virtualMachines",
            "location": "eastus"
        }))
        .unwrap();
        assert_eq!(resource.resource_type, "Microsoft.Compute/virtualMachines");
    }

    #[test]
    fn test_page_without_value_is_empty() {
        let page: Page<Resource> = serde_json::from_value(json!({})).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_format_tags_keeps_provider_order() {
        let tags = json!({"env": "prod", "owner": "ops", "cost-center": 42});
        let tags = tags.as_object().unwrap();
        assert_eq!(format_tags(tags), "env=prod, owner=ops, cost-center=42");
    }

    #[test]
    fn test_follow_link_stops_on_self_reference() {
        let url = "https://x/subscriptions/s/resourcegroups?api-version=1";
        assert_eq!(follow_link("resource groups", url, Some(url.to_string())), None);
    }

    #[test]
    fn test_follow_link_continues_to_new_page() {
        let url = "https://x/subscriptions/s/resourcegroups?api-version=1";
        let next = format!("{}&$skiptoken=abc", url);
        assert_eq!(
            follow_link("resource groups", url, Some(next.clone())),
            Some(next)
        );
        assert_eq!(follow_link("resource groups", url, None), None);
        assert_eq!(follow_link("resource groups", url, Some(String::new())), None);
    }
}
