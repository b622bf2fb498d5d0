//! Reference resolver — fetch a custom resource by identity and decode it
//! into its typed shape.

use tracing::debug;

use crate::error::ResolveError;
use crate::resources::{ApiGroup, TypedResource};
use crate::store::ResourceStore;

/// Fetch `namespace/name` of kind `T` and decode it.
///
/// Read-only: resolving the same name twice against unchanged data yields
/// equal values.
pub async fn resolve<T: TypedResource>(
    store: &dyn ResourceStore,
    api: &ApiGroup,
    namespace: &str,
    name: &str,
) -> Result<T, ResolveError> {
    if namespace.is_empty() {
        return Err(ResolveError::InvalidReference {
            kind: T::KIND.to_string(),
            reason: "namespace is empty".to_string(),
        });
    }
    if name.is_empty() {
        return Err(ResolveError::InvalidReference {
            kind: T::KIND.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    let kind = T::resource_kind(api);
    let value = store.get(&kind, namespace, name).await?;
    debug!(kind = T::KIND, namespace, name, "Resolved resource");

    T::decode(&value).map_err(|reason| ResolveError::Decode {
        kind: T::KIND.to_string(),
        name: name.to_string(),
        reason,
    })
}
