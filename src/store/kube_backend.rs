//! Kubernetes backend — dynamic custom resource access and core Secrets via
//! the `kube` client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ApiResource, DynamicObject, PostParams};
use kube::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{SetupError, StoreError};
use crate::resources::ResourceKind;
use crate::store::traits::{ResourceStore, SecretStore};

/// Store backed by a live cluster.
///
/// Wraps a single `kube::Client`; cloning the client is cheap and every
/// request builds its `Api` handle on the fly.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient configuration (in-cluster service
    /// account, or the local kubeconfig).
    pub async fn try_default() -> Result<Self, SetupError> {
        let client = Client::try_default()
            .await
            .map_err(|e| SetupError::Client(e.to_string()))?;
        Ok(Self::new(client))
    }

    fn dynamic_api(&self, kind: &ResourceKind, namespace: &str) -> Api<DynamicObject> {
        let resource = ApiResource {
            group: kind.group.clone(),
            version: kind.version.clone(),
            api_version: kind.api_version(),
            kind: kind.kind.clone(),
            plural: kind.plural.clone(),
        };
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }
}

/// Map a client error, turning HTTP 404 into `NotFound`.
fn map_kube_error(err: kube::Error, kind: &str, namespace: &str, name: &str) -> StoreError {
    match err {
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => StoreError::Api(other.to_string()),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Value, StoreError> {
        debug!(%kind, namespace, name, "Fetching resource");
        let object = self
            .dynamic_api(kind, namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, &kind.kind, namespace, name))?;
        serde_json::to_value(&object).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn update_status(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        object: Value,
    ) -> Result<(), StoreError> {
        debug!(%kind, namespace, name, "Replacing status");
        let body =
            serde_json::to_vec(&object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.dynamic_api(kind, namespace)
            .replace_status(name, &PostParams::default(), body)
            .await
            .map_err(|e| map_kube_error(e, &kind.kind, namespace, name))?;
        Ok(())
    }
}

#[async_trait]
impl SecretStore for KubeStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        debug!(namespace, name, "Fetching secret");
        let secret = Api::<Secret>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, "Secret", namespace, name))?;
        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }
}
