//! HTTP utilities for Azure REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Non-success answer from Azure Resource Manager
#[derive(Debug, thiserror::Error)]
#[error("API request failed: {status} - {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn from_body(status: StatusCode, body: &str) -> Self {
        // ARM error envelope: {"error": {"code": "...", "message": "..."}}
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                let error = v.get("error")?;
                let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("Error");
                let message = error.get("message").and_then(|m| m.as_str())?;
                Some(format!("({}) {}", code, message))
            })
            .unwrap_or_else(|| sanitize_for_log(body));

        Self { status, message }
    }
}

/// HTTP client wrapper for Azure API calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("azure-resource-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// GET a JSON document, failing with [`ApiError`] on non-success status
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::from_body(status, &body).into());
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    /// POST a JSON body and hand back status and raw body; the caller decides
    /// what a failure status means
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<(StatusCode, String)> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
        }

        Ok((status, response_body))
    }

    /// POST an url-encoded form (token endpoint)
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<(StatusCode, String)> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .context("Failed to send token request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read token response body")?;

        if !status.is_success() {
            // Token endpoint errors never echo the secret, but keep it short anyway
            tracing::error!("Token request failed: {} - {}", status, sanitize_for_log(&body));
        }

        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_short_body_unchanged() {
        assert_eq!(sanitize_for_log("{\"ok\":true}"), "{\"ok\":true}");
    }

    #[test]
    fn test_sanitize_truncates_long_body() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 300 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("line1\nline2\r"), "line1line2");
    }

    #[test]
    fn test_api_error_uses_arm_envelope() {
        let body = r#"{"error":{"code":"AuthorizationFailed","message":"No access"}}"#;
        let err = ApiError::from_body(StatusCode::FORBIDDEN, body);
        assert_eq!(err.message, "(AuthorizationFailed) No access");
        assert_eq!(
            err.to_string(),
            "API request failed: 403 Forbidden - (AuthorizationFailed) No access"
        );
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message, "upstream down");
    }
}
