//! Configuration types.

use std::time::Duration;

use crate::credentials::DEFAULT_TOKEN_KEY;
use crate::error::ConfigError;
use crate::resources::{ApiGroup, DEFAULT_GROUP, DEFAULT_VERSION};
use crate::transport::{DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT, RelayConfig};

/// Controller configuration, built from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace the Email and its references live in.
    pub namespace: String,
    /// Name of the Email resource to reconcile.
    pub email_name: String,
    /// Explicit EmailSenderConfig name; `None` uses the Email's own reference.
    pub sender_name: Option<String>,
    /// Group/version of the custom resources.
    pub api: ApiGroup,
    /// Secret field holding the base64 API token.
    pub token_key: String,
    /// SMTP relay endpoint.
    pub relay: RelayConfig,
}

impl ControllerConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let email_name = get("EMAIL_RESOURCE_NAME")
            .ok_or_else(|| ConfigError::MissingEnvVar("EMAIL_RESOURCE_NAME".to_string()))?;

        let port = match get("SMTP_RELAY_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_RELAY_PORT".to_string(),
                message: e.to_string(),
            })?,
            None => DEFAULT_RELAY_PORT,
        };

        let timeout_secs = match get("SMTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_TIMEOUT_SECS".to_string(),
                message: e.to_string(),
            })?,
            None => 30,
        };

        Ok(Self {
            namespace: get("EMAIL_NAMESPACE").unwrap_or_else(|| "default".to_string()),
            email_name,
            sender_name: get("EMAIL_SENDER_CONFIG"),
            api: ApiGroup {
                group: get("EMAIL_API_GROUP").unwrap_or_else(|| DEFAULT_GROUP.to_string()),
                version: get("EMAIL_API_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            },
            token_key: get("EMAIL_TOKEN_KEY").unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            relay: RelayConfig {
                host: get("SMTP_RELAY_HOST").unwrap_or_else(|| DEFAULT_RELAY_HOST.to_string()),
                port,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
