//! Store traits — the operator's only view of the cluster.
//!
//! The dispatch cycle talks to resources and secrets exclusively through
//! these two traits, so it can run against the Kubernetes API or an
//! in-memory map without change.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::resources::ResourceKind;

/// Generic (schema-less) custom resource access.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch one object as its generic JSON representation.
    ///
    /// Returns `StoreError::NotFound` when no object has that name.
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Value, StoreError>;

    /// Persist `object` through the status subresource.
    ///
    /// Only the `status` sub-object of `object` is expected to change.
    async fn update_status(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        object: Value,
    ) -> Result<(), StoreError>;
}

/// Opaque key/value secret access.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret's fields as raw bytes.
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError>;
}
