//! External event contracts — what crosses the system boundary.
//!
//! The ingestion adapter produces [`InboundRequestEvent`]s from raw transport
//! deliveries; the dispatch gateway consumes [`OutboundNotification`]s. Both
//! sides of the boundary are plain serde types, so transports only ever hand
//! validated, shaped data to the orchestrator.

use crate::task::{Priority, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of inbound event this is. Anything the orchestrator does not
/// recognize fails validation before a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A request that should become a task and be assigned
    AssignmentRequest,
}

/// A normalized inbound event, ready for `Orchestrator::handle`.
///
/// The dedup key collapses duplicate deliveries of the same underlying
/// message into one task; the surrounding messaging substrate is
/// at-least-once, so the same event may arrive more than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundRequestEvent {
    /// Deduplication key (originating message id or content hash)
    pub dedup_key: String,

    /// Who asked
    pub requester_address: String,

    /// Raw subject line from the transport
    pub raw_subject: String,

    /// Raw description text
    pub raw_description: String,

    /// Deadline, if the requester stated one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_deadline: Option<DateTime<Utc>>,

    /// Capability hints extracted during ingestion
    #[serde(default)]
    pub capability_hints: Vec<String>,

    /// Priority extracted during ingestion
    #[serde(default)]
    pub priority: Priority,

    /// Estimated effort in hours, if stated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Event discriminator
    pub event_kind: EventKind,
}

/// A fully rendered outbound notification plus its idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundNotification {
    /// Task id + attempt number; repeated dispatches with the same key must
    /// not produce duplicate sends once the first is confirmed
    pub idempotency_key: String,

    pub to_addresses: Vec<String>,

    #[serde(default)]
    pub cc_addresses: Vec<String>,

    pub subject: String,

    pub body: String,

    pub related_task_id: TaskId,
}

impl OutboundNotification {
    /// Build the idempotency key for a (task, attempt) pair.
    pub fn idempotency_key_for(task_id: &TaskId, attempt: u32) -> String {
        format!("{task_id}#{attempt}")
    }
}
