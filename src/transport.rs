//! Mail transport — deliver one plain-text message through an authenticated
//! SMTP submission relay.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::TransportError;

/// Default submission relay.
pub const DEFAULT_RELAY_HOST: &str = "smtp.mailersend.com";
/// Submission port (STARTTLS).
pub const DEFAULT_RELAY_PORT: u16 = 587;

/// A single plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// What the relay accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Message identifier to record on the Email status.
    pub message_id: String,
}

/// Something that can submit mail on behalf of a sender.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit `mail`, authenticating with `credential`.
    ///
    /// `TransportError::Relay` carries the relay's own error text unchanged.
    async fn deliver(
        &self,
        mail: &OutgoingMail,
        credential: &SecretString,
    ) -> Result<Delivery, TransportError>;
}

/// Relay endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RELAY_HOST.to_string(),
            port: DEFAULT_RELAY_PORT,
            timeout: Duration::from_secs(30),
        }
    }
}

/// SMTP relay via lettre's blocking transport.
///
/// The sender address doubles as the SMTP username and the decoded API token
/// as the password.
pub struct SmtpRelay {
    config: RelayConfig,
}

impl SmtpRelay {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }
}

/// Build the RFC 5322 message and the `Message-ID` assigned to it.
pub fn build_message(mail: &OutgoingMail) -> Result<(Message, String), TransportError> {
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            field: "from".into(),
            reason: e.to_string(),
        })?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            field: "to".into(),
            reason: e.to_string(),
        })?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.as_str())
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|e| TransportError::Build(e.to_string()))?;

    Ok((message, message_id))
}

#[async_trait]
impl MailTransport for SmtpRelay {
    async fn deliver(
        &self,
        mail: &OutgoingMail,
        credential: &SecretString,
    ) -> Result<Delivery, TransportError> {
        let (message, message_id) = build_message(mail)?;
        let credentials =
            Credentials::new(mail.from.clone(), credential.expose_secret().to_string());
        let config = self.config.clone();

        debug!(host = %config.host, port = config.port, to = %mail.to, "Submitting message");

        let response = tokio::task::spawn_blocking(move || {
            let transport = SmtpTransport::starttls_relay(&config.host)
                .map_err(|e| TransportError::Relay(e.to_string()))?
                .port(config.port)
                .timeout(Some(config.timeout))
                .credentials(credentials)
                .build();
            transport
                .send(&message)
                .map_err(|e| TransportError::Relay(e.to_string()))
        })
        .await
        .map_err(|e| TransportError::Relay(format!("SMTP task failed: {e}")))??;

        info!(to = %mail.to, code = %response.code(), message_id = %message_id, "Email sent");
        Ok(Delivery { message_id })
    }
}
