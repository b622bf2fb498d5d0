//! Status writer — re-read an Email and persist a new delivery status.

use tracing::{debug, info};

use crate::error::{ResolveError, StatusWriteError};
use crate::resources::{ApiGroup, Email, EmailStatus, TypedResource};
use crate::store::ResourceStore;

/// Re-fetch `namespace/name` and replace its `status` with `status`.
///
/// Works on the fresh generic copy rather than a typed one, so fields the
/// operator does not model (labels, annotations, concurrent edits) are
/// written back exactly as read.
pub async fn record_status(
    store: &dyn ResourceStore,
    api: &ApiGroup,
    namespace: &str,
    name: &str,
    status: &EmailStatus,
) -> Result<(), StatusWriteError> {
    let kind = api.emails();
    let refetch_failed = |source: ResolveError| StatusWriteError::Refetch {
        namespace: namespace.to_string(),
        name: name.to_string(),
        source,
    };

    let mut object = store
        .get(&kind, namespace, name)
        .await
        .map_err(|e| refetch_failed(e.into()))?;

    // The fresh copy must still be a well-formed Email before writing onto it.
    Email::decode(&object).map_err(|reason| {
        refetch_failed(ResolveError::Decode {
            kind: Email::KIND.to_string(),
            name: name.to_string(),
            reason,
        })
    })?;

    let status_value =
        serde_json::to_value(status).map_err(|e| StatusWriteError::Encode(e.to_string()))?;
    let Some(map) = object.as_object_mut() else {
        return Err(StatusWriteError::Encode("Email is not a JSON object".into()));
    };
    map.insert("status".to_string(), status_value);

    debug!(namespace, name, "Writing status");
    store
        .update_status(&kind, namespace, name, object)
        .await
        .map_err(|source| StatusWriteError::Update {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })?;

    info!(
        namespace,
        name,
        delivery_status = status.delivery_status().map_or("", |s| s.as_str()),
        "Email status updated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store_with_email(api: &ApiGroup) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            &api.emails(),
            "default",
            "welcome",
            json!({
                "metadata": {
                    "name": "welcome",
                    "namespace": "default",
                    "labels": {"team": "growth"}
                },
                "spec": {
                    "senderConfigRef": "noreply",
                    "recipientEmail": "alice@example.com",
                    "subject": "Hi",
                    "body": "Hello"
                },
                "status": {"deliveryStatus": "Failed", "messageId": "", "error": "old"}
            }),
        );
        store
    }

    #[tokio::test]
    async fn writes_successful_status() {
        let api = ApiGroup::default();
        let store = store_with_email(&api);
        record_status(&store, &api, "default", "welcome", &EmailStatus::successful("<m1@x>"))
            .await
            .unwrap();

        let writes = store.status_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].object["status"],
            json!({"deliveryStatus": "Successful", "messageId": "<m1@x>"})
        );
    }

    #[tokio::test]
    async fn preserves_unmodelled_fields() {
        let api = ApiGroup::default();
        let store = store_with_email(&api);
        record_status(&store, &api, "default", "welcome", &EmailStatus::failed("nope"))
            .await
            .unwrap();

        let written = &store.status_writes()[0].object;
        assert_eq!(written["metadata"]["labels"]["team"], "growth");
        assert_eq!(written["spec"]["subject"], "Hi");
        assert_eq!(written["status"]["error"], "nope");
    }

    #[tokio::test]
    async fn rereads_before_writing() {
        let api = ApiGroup::default();
        let store = store_with_email(&api);
        record_status(&store, &api, "default", "welcome", &EmailStatus::failed("x"))
            .await
            .unwrap();
        assert_eq!(store.get_count(), 1);
    }

    #[tokio::test]
    async fn vanished_email_is_refetch_error() {
        let api = ApiGroup::default();
        let store = MemoryStore::new();
        let err = record_status(&store, &api, "default", "welcome", &EmailStatus::failed("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StatusWriteError::Refetch { .. }));
    }

    #[tokio::test]
    async fn malformed_email_is_refetch_error() {
        let api = ApiGroup::default();
        let store = MemoryStore::new();
        let broken = json!({"metadata": {"name": "welcome"}});
        store.insert(&api.emails(), "default", "welcome", broken);
        let err = record_status(&store, &api, "default", "welcome", &EmailStatus::failed("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatusWriteError::Refetch { source: ResolveError::Decode { .. }, .. }
        ));
        assert!(store.status_writes().is_empty());
    }

    #[tokio::test]
    async fn rejected_update_is_update_error() {
        let api = ApiGroup::default();
        let store = store_with_email(&api);
        store.fail_status_writes("the object has been modified");
        let err = record_status(&store, &api, "default", "welcome", &EmailStatus::failed("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("the object has been modified"));
    }
}
