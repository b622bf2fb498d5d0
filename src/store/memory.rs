//! In-memory store — resources and secrets held in maps.
//!
//! Used by the test suite, and by anything that wants to run a cycle
//! without a cluster. Every status write is also appended to a journal so
//! callers can inspect exactly what was persisted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::resources::ResourceKind;
use crate::store::traits::{ResourceStore, SecretStore};

type ObjectKey = (String, String, String);

/// A status write as observed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusWrite {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
    pub object: Value,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectKey, Value>,
    secrets: HashMap<(String, String), BTreeMap<String, Vec<u8>>>,
    status_writes: Vec<StatusWrite>,
    gets: usize,
    fail_status_writes: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn object_key(kind: &ResourceKind, namespace: &str, name: &str) -> ObjectKey {
    (kind.to_string(), namespace.to_string(), name.to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned map is still consistent: every mutation is a single insert or push.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a custom resource.
    pub fn insert(&self, kind: &ResourceKind, namespace: &str, name: &str, object: Value) {
        self.lock()
            .objects
            .insert(object_key(kind, namespace, name), object);
    }

    /// Remove a custom resource, returning it if present.
    pub fn remove(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Option<Value> {
        self.lock().objects.remove(&object_key(kind, namespace, name))
    }

    /// Current stored form of a custom resource.
    pub fn object(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Option<Value> {
        self.lock()
            .objects
            .get(&object_key(kind, namespace, name))
            .cloned()
    }

    /// Insert or replace a secret.
    pub fn insert_secret(
        &self,
        namespace: &str,
        name: &str,
        data: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) {
        self.lock().secrets.insert(
            (namespace.to_string(), name.to_string()),
            data.into_iter().collect(),
        );
    }

    /// Every status write accepted so far, oldest first.
    pub fn status_writes(&self) -> Vec<StatusWrite> {
        self.lock().status_writes.clone()
    }

    /// Number of `get` calls served (hits and misses).
    pub fn get_count(&self) -> usize {
        self.lock().gets
    }

    /// Make every subsequent status write fail with `reason`.
    pub fn fail_status_writes(&self, reason: impl Into<String>) {
        self.lock().fail_status_writes = Some(reason.into());
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Value, StoreError> {
        let mut inner = self.lock();
        inner.gets += 1;
        inner
            .objects
            .get(&object_key(kind, namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.kind.clone(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn update_status(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        object: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.fail_status_writes {
            return Err(StoreError::Api(reason.clone()));
        }

        let key = object_key(kind, namespace, name);
        let Some(stored) = inner.objects.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: kind.kind.clone(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };

        // Status subresource semantics: only `status` is taken from the request.
        let status = object.get("status").cloned().unwrap_or(Value::Null);
        if let Some(map) = stored.as_object_mut() {
            map.insert("status".to_string(), status);
        }

        inner.status_writes.push(StatusWrite {
            kind: kind.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            object,
        });
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        self.lock()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Secret".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}
