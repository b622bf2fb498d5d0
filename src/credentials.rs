//! Credential resolver — read the relay API token out of a secret.
//!
//! The secret field holds base64 text of the token (on top of whatever
//! encoding the secret store itself applies). The decoded token is returned
//! as a `SecretString` and never logged.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use tracing::debug;

use crate::error::{CredentialError, StoreError};
use crate::store::SecretStore;

/// Field name the token is stored under unless configured otherwise.
pub const DEFAULT_TOKEN_KEY: &str = "apiToken";

/// Fetch `namespace/secret_name` and decode the token stored under `key`.
pub async fn resolve_credential(
    secrets: &dyn SecretStore,
    namespace: &str,
    secret_name: &str,
    key: &str,
) -> Result<SecretString, CredentialError> {
    let data = secrets
        .get_secret(namespace, secret_name)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => CredentialError::NotFound {
                namespace: namespace.to_string(),
                name: secret_name.to_string(),
            },
            other => CredentialError::Store(other),
        })?;

    let raw = data.get(key).ok_or_else(|| CredentialError::MissingKey {
        name: secret_name.to_string(),
        key: key.to_string(),
    })?;

    let token = decode_token(raw).map_err(|reason| CredentialError::Encoding {
        name: secret_name.to_string(),
        key: key.to_string(),
        reason,
    })?;

    debug!(namespace, secret = secret_name, "Resolved credential");
    Ok(SecretString::from(token))
}

/// Reverse the base64 transport encoding of a stored token.
fn decode_token(raw: &[u8]) -> Result<String, String> {
    let decoded = STANDARD
        .decode(raw.trim_ascii())
        .map_err(|e| e.to_string())?;
    String::from_utf8(decoded).map_err(|_| "decoded token is not valid UTF-8".to_string())
}
