//! Azure Authentication
//!
//! Service principal (client secret) authentication against Microsoft
//! Entra ID using the OAuth2 client-credentials grant. Credentials are built
//! per tool call and never cached.

use super::http::AzureHttpClient;
use crate::config::{Config, CLIENT_ID_VAR, CLIENT_SECRET_VAR, TENANT_ID_VAR};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Scope for Azure Resource Manager and Cost Management calls
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Service principal credential
#[derive(Clone)]
pub struct ServicePrincipal {
    pub tenant_id: String,
    pub client_id: String,
    client_secret: String,
}

/// Bearer token returned by the token endpoint
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Build a credential from the configured service principal triplet
pub fn acquire_credential(config: &Config) -> Result<ServicePrincipal, ConfigError> {
    let mut missing = Vec::new();
    if config.tenant_id.is_none() {
        missing.push(TENANT_ID_VAR);
    }
    if config.client_id.is_none() {
        missing.push(CLIENT_ID_VAR);
    }
    if config.client_secret.is_none() {
        missing.push(CLIENT_SECRET_VAR);
    }

    match (&config.tenant_id, &config.client_id, &config.client_secret) {
        (Some(tenant_id), Some(client_id), Some(client_secret)) => Ok(ServicePrincipal {
            tenant_id: tenant_id.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        _ => Err(ConfigError::MissingCredentials(missing)),
    }
}

impl ServicePrincipal {
    /// Token endpoint for this tenant
    pub fn token_url(&self, authority_host: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/'),
            urlencoding::encode(&self.tenant_id)
        )
    }

    /// Request an access token for `scope`
    pub async fn get_token(
        &self,
        http: &AzureHttpClient,
        authority_host: &str,
        scope: &str,
    ) -> Result<AccessToken> {
        let url = self.token_url(authority_host);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];

        let (status, body) = http.post_form(&url, &form).await?;

        if !status.is_success() {
            // Entra ID puts the useful part in error_description
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| status.to_string());
            anyhow::bail!(
                "Authentication failed for client '{}' in tenant '{}' ({}): {}",
                self.client_id,
                self.tenant_id,
                status.as_u16(),
                reason
            );
        }

        let token: AccessToken =
            serde_json::from_str(&body).context("Failed to parse token response")?;

        tracing::debug!(
            "Acquired management token, expires in {:?}s",
            token.expires_in
        );

        Ok(token)
    }
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
