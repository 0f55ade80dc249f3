//! HTTP client for the commerce platform's discount code endpoint.
//!
//! Wraps `reqwest::Client` with project-scoped URLs, OAuth2 authentication
//! and mapping of platform error responses into [`ApiError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::PlatformAuth;
use crate::config::PlatformConfig;
use crate::contract::DiscountCodesApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    DiscountCode, DiscountCodeDraft, DiscountCodePage, DiscountCodeUpdate, ErrorResponse,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when listing all codes. The platform caps pages at 500.
const PAGE_LIMIT: i64 = 500;

/// REST client for one project on the commerce platform.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    /// Base URL of the API, without the project key.
    api_url: String,
    project_key: String,
    auth: PlatformAuth,
    http_client: Client,
}

impl PlatformClient {
    /// Create a client from merged configuration.
    pub fn new(config: &PlatformConfig) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("promo-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ApiError::invalid_config(format!("failed to build HTTP client: {e}"))
            })?;

        if config.project_key.is_empty() {
            return Err(ApiError::invalid_config("project_key must not be empty"));
        }

        let auth = PlatformAuth::new(
            &config.auth_url,
            config.credentials.clone(),
            config.scopes.clone(),
            http_client.clone(),
        );

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project_key: config.project_key.clone(),
            auth,
            http_client,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        api_url: String,
        project_key: String,
        auth: PlatformAuth,
        http_client: Client,
    ) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            project_key,
            auth,
            http_client,
        }
    }

    #[must_use]
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    fn discount_codes_url(&self) -> String {
        format!("{}/{}/discount-codes", self.api_url, self.project_key)
    }

    async fn get_page(&self, limit: i64, offset: i64) -> ApiResult<DiscountCodePage> {
        let url = self.discount_codes_url();
        debug!("platform GET {} (limit={}, offset={})", url, limit, offset);
        let builder = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string())]);
        let builder = self.auth.apply(builder).await?;
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!("platform GET {}", url);
        let builder = self.http_client.get(url);
        let builder = self.auth.apply(builder).await?;
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> ApiResult<T> {
        debug!("platform POST {}", url);
        let builder = self.http_client.post(url);
        let builder = self.auth.apply(builder).await?;
        let response = builder.json(body).send().await?;
        self.handle_response(response).await
    }

    async fn delete_with_params<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        debug!("platform DELETE {}", url);
        let builder = self.http_client.delete(url).query(params);
        let builder = self.auth.apply(builder).await?;
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            debug!(status = %status, body = %body, "Platform response");
            serde_json::from_str(&body).map_err(ApiError::Decode)
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        // Retry-After arrives with 429 responses when the platform throttles.
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let message = platform_error_message(&body, status);

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            StatusCode::CONFLICT => Err(ApiError::conflict(message)),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("platform rate limited, retry after {:?}", retry_after);
                Err(ApiError::RateLimited { retry_after })
            }
            StatusCode::UNAUTHORIZED => {
                // A 401 means the cached token went stale; drop it.
                self.auth.invalidate_cache().await;
                Err(ApiError::unauthorized(format!(
                    "authentication failed (401): {message}"
                )))
            }
            _ => Err(ApiError::Platform {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[async_trait]
impl DiscountCodesApi for PlatformClient {
    async fn create(&self, draft: &DiscountCodeDraft) -> ApiResult<DiscountCode> {
        let url = self.discount_codes_url();
        self.post(&url, draft).await
    }

    async fn get_by_id(&self, id: &str) -> ApiResult<DiscountCode> {
        let url = format!("{}/{}", self.discount_codes_url(), id);
        self.get(&url).await
    }

    async fn find_by_code(&self, code: &str) -> ApiResult<Option<DiscountCode>> {
        let url = self.discount_codes_url();
        let escaped = escape_predicate_value(code);
        let predicate = format!("code=\"{escaped}\"");
        debug!("platform GET {} (where={})", url, predicate);
        let builder = self
            .http_client
            .get(&url)
            .query(&[("where", predicate), ("limit", "1".to_string())]);
        let builder = self.auth.apply(builder).await?;
        let response = builder.send().await?;
        let page: DiscountCodePage = self.handle_response(response).await?;
        Ok(page.results.into_iter().next())
    }

    async fn list_all(&self) -> ApiResult<Vec<DiscountCode>> {
        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.get_page(PAGE_LIMIT, offset).await?;
            let fetched = page.results.len() as i64;
            collected.extend(page.results);
            if fetched < PAGE_LIMIT {
                break;
            }
            offset += fetched;
        }
        Ok(collected)
    }

    async fn update(&self, id: &str, update: &DiscountCodeUpdate) -> ApiResult<DiscountCode> {
        let url = format!("{}/{}", self.discount_codes_url(), id);
        self.post(&url, update).await
    }

    async fn delete(&self, id: &str, version: i64) -> ApiResult<DiscountCode> {
        let url = format!("{}/{}", self.discount_codes_url(), id);
        self.delete_with_params(
            &url,
            &[
                ("version", version.to_string()),
                ("dataErasure", "true".to_string()),
            ],
        )
        .await
    }
}

/// Extract the human-readable message from a platform error body, falling
/// back to the raw body or the bare status.
fn platform_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.message;
    }
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}

/// Escape a value for use inside a `where` predicate string literal.
///
/// Backslashes and double-quotes are escaped so a code containing quotes
/// cannot break out of the predicate.
fn escape_predicate_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_predicate_value("plain"), "plain");
        assert_eq!(escape_predicate_value("a\"b"), "a\\\"b");
        assert_eq!(escape_predicate_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn error_message_prefers_platform_body() {
        let body = r#"{"statusCode":400,"message":"DuplicateField: code","errors":[]}"#;
        assert_eq!(
            platform_error_message(body, StatusCode::BAD_REQUEST),
            "DuplicateField: code"
        );
        assert_eq!(
            platform_error_message("", StatusCode::BAD_GATEWAY),
            "HTTP 502 Bad Gateway"
        );
        assert_eq!(
            platform_error_message("boom", StatusCode::INTERNAL_SERVER_ERROR),
            "boom"
        );
    }
}
