// promo-sync/src/config.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::LocalizedString;

/// Fully merged runtime configuration: platform connection settings from the
/// YAML file plus credentials injected from the environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub platform: PlatformConfig,
    pub discount_codes: Vec<DesiredDiscountCode>,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            project_key = %self.platform.project_key,
            declared_codes = self.discount_codes.len(),
            "Loaded sync configuration"
        );
        debug!(?self, "Sync configuration (full debug)");
    }
}

/// Where and how to talk to the commerce platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Base URL of the REST API, without the project key.
    pub api_url: String,
    /// Base URL of the OAuth token endpoint host.
    pub auth_url: String,
    pub project_key: String,
    /// OAuth scopes requested with the token. Empty means the server default.
    pub scopes: Vec<String>,
    pub credentials: Credentials,
}

impl PlatformConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_url = %self.api_url,
            auth_url = %self.auth_url,
            project_key = %self.project_key,
            scopes = ?self.scopes,
            "Loaded platform connection settings"
        );
    }
}

/// OAuth client credentials. The secret never appears in Debug output.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// One discount code as declared in the configuration file.
///
/// Timestamps stay as RFC 3339 strings here; they are parsed when building
/// API payloads so a bad value fails before any call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredDiscountCode {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub cart_discounts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications_per_customer: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

fn default_is_active() -> bool {
    true
}

impl DesiredDiscountCode {
    pub fn trace_loaded(&self) {
        info!(
            code = %self.code,
            cart_discounts = self.cart_discounts.len(),
            is_active = self.is_active,
            "Loaded declared discount code"
        );
    }
}
