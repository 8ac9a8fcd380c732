//! Dispatch gateway — the idempotent outbound edge.
//!
//! The transport below is at-least-once; the ledger above it makes the
//! logical effect at-most-once. The sequence per notification:
//!
//! 1. Skip entirely if the idempotency key is already confirmed.
//! 2. Deliver with bounded backoff.
//! 3. Confirm the key and log the outgoing message; only the caller that
//!    wins the confirmation writes the message, so a delivery race never
//!    double-logs.
//!
//! Exhausted retries flag the task undelivered and surface as
//! [`DispatchError::Exhausted`]; the assignment itself stands.

use std::sync::Arc;

use coverdesk_config::CollaboratorPolicy;
use coverdesk_core::collaborator::OutboundTransport;
use coverdesk_core::error::{DispatchError, OrchestrationError};
use coverdesk_core::event::OutboundNotification;
use coverdesk_core::message::Message;
use coverdesk_core::store::ContextStore;
use coverdesk_core::Identity;
use coverdesk_providers::call_with_retry;
use tracing::{info, warn};

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and confirmed by this call (or confirmed concurrently
    /// while this call was delivering).
    Delivered,
    /// A previous dispatch already confirmed this key; nothing was sent.
    AlreadyConfirmed,
}

/// Owns the outbound path: transport, retry policy, idempotency ledger.
pub struct DispatchGateway {
    store: Arc<dyn ContextStore>,
    transport: Arc<dyn OutboundTransport>,
    identity: Identity,
    policy: CollaboratorPolicy,
}

impl DispatchGateway {
    pub fn new(
        store: Arc<dyn ContextStore>,
        transport: Arc<dyn OutboundTransport>,
        identity: Identity,
        policy: CollaboratorPolicy,
    ) -> Self {
        Self {
            store,
            transport,
            identity,
            policy,
        }
    }

    /// Dispatch one notification with at-most-once logical effect.
    pub async fn send(
        &self,
        notification: &OutboundNotification,
    ) -> Result<DispatchOutcome, OrchestrationError> {
        if self
            .store
            .dispatch_confirmed(&notification.idempotency_key)
            .await?
        {
            info!(
                idempotency_key = %notification.idempotency_key,
                "Dispatch already confirmed, skipping"
            );
            return Ok(DispatchOutcome::AlreadyConfirmed);
        }

        let delivery = call_with_retry(self.transport.name(), &self.policy, || {
            self.transport.deliver(notification)
        })
        .await;

        match delivery {
            Ok(()) => {
                let won = self
                    .store
                    .confirm_dispatch(&notification.idempotency_key)
                    .await?;
                if won {
                    self.store
                        .append_message(Message::outgoing(
                            self.identity.address.clone(),
                            notification.to_addresses.clone(),
                            notification.subject.clone(),
                            notification.body.clone(),
                        ))
                        .await?;
                }
                info!(
                    idempotency_key = %notification.idempotency_key,
                    to = %notification.to_addresses.join(", "),
                    "Notification delivered"
                );
                Ok(DispatchOutcome::Delivered)
            }
            Err(OrchestrationError::CollaboratorExhausted {
                attempts,
                last_error,
                ..
            }) => {
                warn!(
                    task_id = %notification.related_task_id,
                    attempts,
                    "Delivery exhausted, flagging task undelivered"
                );
                self.store
                    .mark_undelivered(&notification.related_task_id)
                    .await?;
                Err(DispatchError::Exhausted {
                    to: notification.to_addresses.join(", "),
                    attempts,
                    last_error,
                }
                .into())
            }
            Err(other) => Err(other),
        }
    }
}
