//! Dispatch cycle — one reconciliation pass for a single Email resource.
//!
//! Stages run strictly in order:
//! 1. Resolve the Email (failure aborts; there is nothing to write onto)
//! 2. Resolve its EmailSenderConfig
//! 3. Resolve the relay credential from the sender's secret
//! 4. Hand the message to the mail transport
//! 5. Re-read the Email and record Successful or Failed on its status
//!
//! Failures in stages 2–4 become a Failed status, not an error.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::credentials::{DEFAULT_TOKEN_KEY, resolve_credential};
use crate::error::{Error, Result};
use crate::resolver::resolve;
use crate::resources::{ApiGroup, Email, EmailStatus, SenderConfig};
use crate::status::record_status;
use crate::store::{ResourceStore, SecretStore};
use crate::transport::{MailTransport, OutgoingMail};

/// Where a cycle is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Init,
    Resolving,
    Dispatching,
    Recording,
    Done,
    Aborted,
}

impl CyclePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Init => "init",
            CyclePhase::Resolving => "resolving",
            CyclePhase::Dispatching => "dispatching",
            CyclePhase::Recording => "recording",
            CyclePhase::Done => "done",
            CyclePhase::Aborted => "aborted",
        }
    }
}

/// The stage a Failed outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    SenderConfig,
    Credential,
    Dispatch,
}

/// Result of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Status that was written onto the Email.
    pub status: EmailStatus,
    /// Set when `status` is Failed.
    pub failed_stage: Option<FailedStage>,
}

struct StageFailure {
    stage: FailedStage,
    message: String,
}

impl StageFailure {
    fn new(stage: FailedStage, err: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

/// Tracks the current phase and logs each transition.
struct PhaseTracker<'a> {
    namespace: &'a str,
    email: &'a str,
    phase: CyclePhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(namespace: &'a str, email: &'a str) -> Self {
        Self {
            namespace,
            email,
            phase: CyclePhase::Init,
        }
    }

    fn advance(&mut self, next: CyclePhase) {
        debug!(
            namespace = self.namespace,
            email = self.email,
            from = self.phase.label(),
            to = next.label(),
            "Cycle phase"
        );
        self.phase = next;
    }
}

/// Reconciles Email resources against a mail transport.
///
/// Holds no per-cycle state; the same instance can run any number of
/// cycles for any namespace/name.
pub struct DispatchCycle {
    resources: Arc<dyn ResourceStore>,
    secrets: Arc<dyn SecretStore>,
    transport: Arc<dyn MailTransport>,
    api: ApiGroup,
    token_key: String,
}

impl DispatchCycle {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            resources,
            secrets,
            transport,
            api: ApiGroup::default(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }

    /// Use a different group/version for the custom resources.
    pub fn with_api_group(mut self, api: ApiGroup) -> Self {
        self.api = api;
        self
    }

    /// Read the token from a different secret field.
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Run one cycle for `namespace/email_name`.
    ///
    /// `sender_name` names the EmailSenderConfig explicitly; when `None` the
    /// Email's own `senderConfigRef` is used. With neither, the cycle records
    /// a SenderConfig failure.
    ///
    /// Returns `Err` only if the Email cannot be resolved or the final status
    /// write fails. Every other failure is recorded on the Email and reported
    /// through `CycleOutcome`.
    pub async fn run(
        &self,
        namespace: &str,
        email_name: &str,
        sender_name: Option<&str>,
    ) -> Result<CycleOutcome> {
        let mut phase = PhaseTracker::new(namespace, email_name);
        phase.advance(CyclePhase::Resolving);

        let resolved = resolve(self.resources.as_ref(), &self.api, namespace, email_name).await;
        let email: Email = match resolved {
            Ok(email) => email,
            Err(e) => {
                phase.advance(CyclePhase::Aborted);
                error!(
                    namespace,
                    email = email_name,
                    error = %e,
                    "Cannot resolve Email, aborting cycle"
                );
                return Err(Error::EmailUnavailable(e));
            }
        };

        let referenced = email.spec.sender_config_ref.as_deref();
        let sender_ref = match sender_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                if let Some(referenced) = referenced
                    && referenced != name
                {
                    warn!(
                        namespace,
                        email = email_name,
                        requested = name,
                        referenced,
                        "Explicit sender overrides the Email's senderConfigRef"
                    );
                }
                Some(name)
            }
            None => referenced,
        };

        let (status, failed_stage) = match self
            .attempt(&mut phase, namespace, &email, sender_ref)
            .await
        {
            Ok(message_id) => (EmailStatus::successful(message_id), None),
            Err(failure) => {
                warn!(
                    namespace,
                    email = email_name,
                    stage = ?failure.stage,
                    error = %failure.message,
                    "Delivery failed"
                );
                (EmailStatus::failed(failure.message), Some(failure.stage))
            }
        };

        phase.advance(CyclePhase::Recording);
        let store = self.resources.as_ref();
        let recorded = record_status(store, &self.api, namespace, email_name, &status).await;
        if let Err(e) = recorded {
            error!(
                namespace,
                email = email_name,
                error = %e,
                "Failed to record delivery status"
            );
            return Err(e.into());
        }

        phase.advance(CyclePhase::Done);
        info!(
            namespace,
            email = email_name,
            delivery_status = status.delivery_status().map_or("", |s| s.as_str()),
            "Cycle complete"
        );
        Ok(CycleOutcome {
            status,
            failed_stage,
        })
    }

    /// Stages 2–4. Returns the provider message id on success.
    async fn attempt(
        &self,
        phase: &mut PhaseTracker<'_>,
        namespace: &str,
        email: &Email,
        sender_ref: Option<&str>,
    ) -> std::result::Result<String, StageFailure> {
        let sender_ref = sender_ref.ok_or_else(|| {
            StageFailure::new(FailedStage::SenderConfig, "Email has no senderConfigRef")
        })?;
        let sender: SenderConfig =
            resolve(self.resources.as_ref(), &self.api, namespace, sender_ref)
                .await
                .map_err(|e| StageFailure::new(FailedStage::SenderConfig, e))?;

        let credential = resolve_credential(
            self.secrets.as_ref(),
            namespace,
            &sender.spec.api_token_secret_ref,
            &self.token_key,
        )
        .await
        .map_err(|e| StageFailure::new(FailedStage::Credential, e))?;

        phase.advance(CyclePhase::Dispatching);
        let mail = OutgoingMail {
            from: sender.spec.sender_email.clone(),
            to: email.spec.recipient_email.clone(),
            subject: email.spec.subject.clone(),
            body: email.spec.body.clone(),
        };
        let delivery = self
            .transport
            .deliver(&mail, &credential)
            .await
            .map_err(|e| StageFailure::new(FailedStage::Dispatch, e))?;

        Ok(delivery.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels() {
        assert_eq!(CyclePhase::Init.label(), "init");
        assert_eq!(CyclePhase::Aborted.label(), "aborted");
    }

    #[test]
    fn phase_tracker_advances() {
        let mut tracker = PhaseTracker::new("default", "welcome");
        assert_eq!(tracker.phase, CyclePhase::Init);
        tracker.advance(CyclePhase::Resolving);
        tracker.advance(CyclePhase::Recording);
        assert_eq!(tracker.phase, CyclePhase::Recording);
    }

    #[test]
    fn stage_failure_keeps_text_verbatim() {
        let failure =
            StageFailure::new(FailedStage::Dispatch, "535 5.7.8 Authentication failed");
        assert_eq!(failure.message, "535 5.7.8 Authentication failed");
        assert_eq!(failure.stage, FailedStage::Dispatch);
    }
}
