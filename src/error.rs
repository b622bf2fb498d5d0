//! Error types for the email operator.

/// Top-level error type for a reconciliation cycle.
///
/// Only failures that leave the controller unable to record an outcome end
/// up here. Everything that goes wrong after the Email resource is known is
/// written onto its status instead. `ConfigError` and `SetupError` happen
/// before a cycle exists and are reported by the binary directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Email resource unavailable: {0}")]
    EmailUnavailable(ResolveError),

    #[error("Status write failed: {0}")]
    StatusWrite(#[from] StatusWriteError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Connectivity to the resource or secret store could not be established.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to build cluster client: {0}")]
    Client(String),

    #[error("TLS provider initialisation failed: {0}")]
    Tls(String),
}

/// Errors returned by a `ResourceStore` or `SecretStore` backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Reference resolution errors (generic representation → typed resource).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid {kind} reference: {reason}")]
    InvalidReference { kind: String, reason: String },

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("Failed to decode {kind} {name}: {reason}")]
    Decode {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                kind,
                namespace,
                name,
            } => ResolveError::NotFound {
                kind,
                namespace,
                name,
            },
            other => ResolveError::Store(other),
        }
    }
}

/// Credential lookup and decoding errors.
///
/// None of the variants carry the secret value itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("Secret {name} has no field {key}")]
    MissingKey { name: String, key: String },

    #[error("Secret {name} field {key} is not validly encoded: {reason}")]
    Encoding {
        name: String,
        key: String,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(StoreError),
}

/// Mail relay errors. `Relay` carries the transport's own text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid {field} address: {reason}")]
    InvalidAddress { field: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("{0}")]
    Relay(String),
}

/// The final status write could not be performed.
#[derive(Debug, thiserror::Error)]
pub enum StatusWriteError {
    #[error("Failed to re-read Email {namespace}/{name}: {source}")]
    Refetch {
        namespace: String,
        name: String,
        source: ResolveError,
    },

    #[error("Failed to encode status: {0}")]
    Encode(String),

    #[error("Failed to update status of Email {namespace}/{name}: {source}")]
    Update {
        namespace: String,
        name: String,
        source: StoreError,
    },
}

/// Result type alias for the operator.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn is_abort(err: &Error) -> bool {
        match err {
            Error::EmailUnavailable(_) => true,
            Error::StatusWrite(_) => false,
        }
    }

    #[test]
    fn cycle_errors_are_abort_or_status_write() {
        let abort = Error::EmailUnavailable(ResolveError::NotFound {
            kind: "Email".into(),
            namespace: "default".into(),
            name: "welcome".into(),
        });
        assert!(is_abort(&abort));
        assert_eq!(
            abort.to_string(),
            "Email resource unavailable: Email default/welcome not found"
        );

        let write = Error::from(StatusWriteError::Encode("bad".into()));
        assert!(!is_abort(&write));
    }
}
