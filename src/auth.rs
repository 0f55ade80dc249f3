//! Platform authentication via the OAuth2 client credentials grant.
//!
//! Tokens are cached until shortly before expiry and shared across clones of
//! the handler; a 401 from the API invalidates the cache so the next call
//! fetches a fresh token.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{ApiError, ApiResult};

/// Token response from the auth server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached access token with expiry. The token never appears in Debug output.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Instant::now() >= exp,
            None => false,
        }
    }
}

/// Fetches and caches access tokens for the commerce platform.
#[derive(Debug, Clone)]
pub struct PlatformAuth {
    token_endpoint: String,
    credentials: Credentials,
    scopes: Vec<String>,
    /// Cached token, shared across clones.
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: reqwest::Client,
}

impl PlatformAuth {
    /// Create an auth handler. `auth_url` is the token server base URL
    /// without a trailing slash.
    #[must_use]
    pub fn new(
        auth_url: &str,
        credentials: Credentials,
        scopes: Vec<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            token_endpoint: format!("{auth_url}/oauth/token"),
            credentials,
            scopes,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Get an access token, fetching a new one if the cache is empty or
    /// expired.
    pub async fn get_access_token(&self) -> ApiResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if !cached.is_expired() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        debug!(token_endpoint = %self.token_endpoint, "Fetching OAuth2 access token");
        let mut form = vec![("grant_type", "client_credentials")];
        let scope_str = self.scopes.join(" ");
        if !self.scopes.is_empty() {
            form.push(("scope", &scope_str));
        }

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::unauthorized(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ApiError::unauthorized(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::unauthorized(format!("failed to parse token response: {e}")))?;

        let expires_at = token_response.expires_in.map(|secs| {
            // Expire 30 seconds early to avoid sending a token that dies in flight.
            Instant::now() + Duration::from_secs(secs.saturating_sub(30))
        });

        let access_token = token_response.access_token.clone();

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(CachedToken {
                access_token: token_response.access_token,
                expires_at,
            });
        }

        Ok(access_token)
    }

    /// Apply a Bearer token to a request builder.
    pub async fn apply(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.get_access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}
