use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{Credentials, DesiredDiscountCode, PlatformConfig, SyncConfig};
use crate::schema;

/// Environment variable holding the OAuth client ID.
pub const ENV_CLIENT_ID: &str = "COMMERCE_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "COMMERCE_CLIENT_SECRET";

#[derive(Deserialize)]
struct StaticConfig {
    platform: PlatformSection,
    #[serde(default)]
    discount_codes: Vec<DesiredDiscountCode>,
}

#[derive(Deserialize)]
struct PlatformSection {
    api_url: String,
    auth_url: String,
    project_key: String,
    #[serde(default)]
    scopes: Vec<String>,
}

/// Loads the static YAML config file (no secrets) and injects the OAuth
/// credentials from the environment. Returns a fully merged `SyncConfig`
/// or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let client_id = match std::env::var(ENV_CLIENT_ID) {
        Ok(id) if !id.is_empty() => {
            info!("{ENV_CLIENT_ID} found in env");
            id
        }
        Ok(_) => {
            error!("{ENV_CLIENT_ID} environment variable is empty");
            return Err(anyhow::anyhow!(
                "{ENV_CLIENT_ID} environment variable is empty"
            ));
        }
        Err(e) => {
            error!(error = ?e, "{ENV_CLIENT_ID} environment variable not set");
            return Err(anyhow::anyhow!(
                "{ENV_CLIENT_ID} environment variable not set: {e}"
            ));
        }
    };

    let client_secret = match std::env::var(ENV_CLIENT_SECRET) {
        Ok(secret) if !secret.is_empty() => {
            info!("{ENV_CLIENT_SECRET} found in env");
            secret
        }
        Ok(_) => {
            error!("{ENV_CLIENT_SECRET} environment variable is empty");
            return Err(anyhow::anyhow!(
                "{ENV_CLIENT_SECRET} environment variable is empty"
            ));
        }
        Err(e) => {
            error!(error = ?e, "{ENV_CLIENT_SECRET} environment variable not set");
            return Err(anyhow::anyhow!(
                "{ENV_CLIENT_SECRET} environment variable not set: {e}"
            ));
        }
    };

    validate_declared_codes(&static_conf.discount_codes)?;

    for code in &static_conf.discount_codes {
        code.trace_loaded();
    }

    let platform = PlatformConfig {
        api_url: static_conf.platform.api_url.trim_end_matches('/').to_string(),
        auth_url: static_conf.platform.auth_url.trim_end_matches('/').to_string(),
        project_key: static_conf.platform.project_key,
        scopes: static_conf.platform.scopes,
        credentials: Credentials {
            client_id,
            client_secret,
        },
    };
    platform.trace_loaded();

    if platform.project_key.is_empty() {
        error!("platform.project_key must not be empty");
        anyhow::bail!("platform.project_key must not be empty");
    }

    info!(
        project_key = %platform.project_key,
        declared_codes = static_conf.discount_codes.len(),
        "Config loaded and merged successfully"
    );

    Ok(SyncConfig {
        platform,
        discount_codes: static_conf.discount_codes,
    })
}

/// Rejects configs that would fail mid-apply: duplicate codes, plus every
/// per-definition field rule the schema module checks.
fn validate_declared_codes(codes: &[DesiredDiscountCode]) -> Result<()> {
    let mut seen = HashSet::new();
    for declared in codes {
        let problems = schema::validate_definition(declared);
        for problem in &problems {
            error!(code = %declared.code, %problem, "Invalid discount code definition");
        }
        if let Some(problem) = problems.first() {
            anyhow::bail!("discount code '{}': {problem}", declared.code);
        }
        if !seen.insert(declared.code.as_str()) {
            error!(code = %declared.code, "Duplicate discount code in config");
            anyhow::bail!("discount code '{}' is declared more than once", declared.code);
        }
    }
    Ok(())
}
