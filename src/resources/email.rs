//! `Email` custom resource: the operator-authored send request and the
//! controller-owned delivery status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiGroup, Fields, ObjectMeta, ResourceKind, TypedResource};

/// Outcome recorded on an Email's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Successful,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Successful => "Successful",
            DeliveryStatus::Failed => "Failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Successful" => Some(DeliveryStatus::Successful),
            "Failed" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}

/// Operator-authored part of an Email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSpec {
    /// Name of the `EmailSenderConfig` in the same namespace. An empty
    /// reference decodes as `None`.
    pub sender_config_ref: Option<String>,
    /// Validated only when the message is built, so a bad address is
    /// recorded on the Email rather than aborting the cycle.
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
}

/// Controller-owned part of an Email.
///
/// Built only through [`EmailStatus::successful`] and [`EmailStatus::failed`]
/// so a written status always pairs the outcome with exactly one of
/// `message_id` / `error`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_status: Option<DeliveryStatus>,
    message_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    error: String,
}

impl EmailStatus {
    pub fn successful(message_id: impl Into<String>) -> Self {
        Self {
            delivery_status: Some(DeliveryStatus::Successful),
            message_id: message_id.into(),
            error: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            delivery_status: Some(DeliveryStatus::Failed),
            message_id: String::new(),
            error: error.into(),
        }
    }

    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.delivery_status
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// Decode a status sub-object as read back from the store.
    ///
    /// The status is controller-owned and about to be overwritten, so any
    /// field that is missing, mistyped or holds an unknown `deliveryStatus`
    /// reads as unset instead of failing the decode.
    fn decode(fields: &Fields<'_>) -> Self {
        Self {
            delivery_status: fields
                .string_or_unset("status.deliveryStatus")
                .as_deref()
                .and_then(DeliveryStatus::parse),
            message_id: fields
                .string_or_unset("status.messageId")
                .unwrap_or_default(),
            error: fields.string_or_unset("status.error").unwrap_or_default(),
        }
    }
}

/// A request to send one plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub metadata: ObjectMeta,
    pub spec: EmailSpec,
    pub status: EmailStatus,
}

impl TypedResource for Email {
    const KIND: &'static str = "Email";

    fn resource_kind(api: &ApiGroup) -> ResourceKind {
        api.emails()
    }

    fn decode(value: &Value) -> Result<Self, String> {
        let fields = Fields::new(value)?;
        let metadata = fields.metadata()?;
        fields.object("spec")?;
        let spec = EmailSpec {
            sender_config_ref: fields
                .optional_string("spec.senderConfigRef")?
                .filter(|name| !name.is_empty()),
            recipient_email: fields.string("spec.recipientEmail")?,
            subject: fields.string("spec.subject")?,
            body: fields.string("spec.body")?,
        };
        let status = EmailStatus::decode(&fields);
        Ok(Self {
            metadata,
            spec,
            status,
        })
    }
}
