//! `EmailSenderConfig` custom resource: who mail is sent as, and where the
//! relay credential lives.

use serde_json::Value;

use super::{ApiGroup, Fields, ObjectMeta, ResourceKind, TypedResource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfigSpec {
    /// Name of the Secret holding the relay API token.
    pub api_token_secret_ref: String,
    pub sender_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub metadata: ObjectMeta,
    pub spec: SenderConfigSpec,
}

impl TypedResource for SenderConfig {
    const KIND: &'static str = "EmailSenderConfig";

    fn resource_kind(api: &ApiGroup) -> ResourceKind {
        api.sender_configs()
    }

    fn decode(value: &Value) -> Result<Self, String> {
        let fields = Fields::new(value)?;
        let metadata = fields.metadata()?;
        fields.object("spec")?;
        Ok(Self {
            metadata,
            spec: SenderConfigSpec {
                api_token_secret_ref: fields.non_empty("spec.apiTokenSecretRef")?,
                sender_email: fields.non_empty("spec.senderEmail")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_sender_config() {
        let value = json!({
            "metadata": {"name": "noreply", "namespace": "mail"},
            "spec": {"apiTokenSecretRef": "relay-token", "senderEmail": "noreply@example.com"}
        });
        let sender = SenderConfig::decode(&value).unwrap();
        assert_eq!(sender.metadata.namespace, "mail");
        assert_eq!(sender.spec.api_token_secret_ref, "relay-token");
        assert_eq!(sender.spec.sender_email, "noreply@example.com");
    }

    #[test]
    fn decode_rejects_empty_secret_ref() {
        let value = json!({
            "metadata": {"name": "noreply"},
            "spec": {"apiTokenSecretRef": "", "senderEmail": "noreply@example.com"}
        });
        assert_eq!(
            SenderConfig::decode(&value).unwrap_err(),
            "field `spec.apiTokenSecretRef` must not be empty"
        );
    }

    #[test]
    fn decode_rejects_missing_metadata_name() {
        let value = json!({
            "metadata": {},
            "spec": {"apiTokenSecretRef": "t", "senderEmail": "a@b.c"}
        });
        assert_eq!(
            SenderConfig::decode(&value).unwrap_err(),
            "missing field `metadata.name`"
        );
    }
}
