//! Configuration Management
//!
//! Runtime settings are read once at startup from the process environment
//! (optionally seeded from a `.env` file) and passed by reference into each
//! tool handler.

use anyhow::{Context, Result};
use url::Url;

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";
pub const AUTHORITY_HOST_VAR: &str = "AZURE_AUTHORITY_HOST";
pub const RESOURCE_MANAGER_URL_VAR: &str = "AZURE_RESOURCE_MANAGER_URL";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_MANAGER_URL: &str = "https://management.azure.com";

/// Server configuration
///
/// The service principal triplet is optional here: a missing value is only
/// reported when a tool actually needs a credential, so the server can still
/// start and answer `tools/list`.
#[derive(Clone, Default)]
pub struct Config {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Default subscription used when a tool call doesn't name one
    pub subscription_id: Option<String>,
    pub authority_host: String,
    pub resource_manager_url: String,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the normal case
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let authority_host = read(AUTHORITY_HOST_VAR)
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        let resource_manager_url = read(RESOURCE_MANAGER_URL_VAR)
            .unwrap_or_else(|| DEFAULT_RESOURCE_MANAGER_URL.to_string());

        validate_endpoint(&authority_host, AUTHORITY_HOST_VAR)?;
        validate_endpoint(&resource_manager_url, RESOURCE_MANAGER_URL_VAR)?;

        Ok(Self {
            tenant_id: read(TENANT_ID_VAR),
            client_id: read(CLIENT_ID_VAR),
            client_secret: read(CLIENT_SECRET_VAR),
            subscription_id: read(SUBSCRIPTION_ID_VAR),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            resource_manager_url: resource_manager_url.trim_end_matches('/').to_string(),
        })
    }

    /// Override the default subscription (CLI > environment)
    pub fn with_subscription(mut self, subscription_id: Option<String>) -> Self {
        if let Some(id) = subscription_id.filter(|s| !s.trim().is_empty()) {
            self.subscription_id = Some(id.trim().to_string());
        }
        self
    }

    /// Resolve the subscription for a call (argument > configured default)
    pub fn resolve_subscription(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.subscription_id.clone())
    }
}

impl std::fmt::Debug for Config {
    // Security: never print the client secret
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("subscription_id", &self.subscription_id)
            .field("authority_host", &self.authority_host)
            .field("resource_manager_url", &self.resource_manager_url)
            .finish()
    }
}

/// Endpoints carry bearer tokens and secrets, so they must use HTTPS.
/// Loopback hosts are allowed over plain HTTP for local testing.
fn validate_endpoint(value: &str, var: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{var} is not a valid URL: {value}"))?;

    match url.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(&url) => Ok(()),
        scheme => anyhow::bail!("{var} must use HTTPS, got: {scheme}://"),
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"))
}
