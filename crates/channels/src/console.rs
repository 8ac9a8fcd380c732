//! Console transport — prints notifications instead of sending them.
//!
//! The default transport for local runs and the orchestrator's test double.
//! Delivery is a log line plus the rendered body on stdout, so a dry run
//! shows exactly what an SMTP transport would have sent.

use async_trait::async_trait;
use coverdesk_core::collaborator::OutboundTransport;
use coverdesk_core::error::CollaboratorError;
use coverdesk_core::event::OutboundNotification;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutboundTransport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, notification: &OutboundNotification) -> Result<(), CollaboratorError> {
        info!(
            idempotency_key = %notification.idempotency_key,
            to = %notification.to_addresses.join(", "),
            subject = %notification.subject,
            "Delivering notification"
        );
        println!(
            "--- outbound ---\nTo: {}\nSubject: {}\n\n{}\n----------------",
            notification.to_addresses.join(", "),
            notification.subject,
            notification.body
        );
        Ok(())
    }
}
