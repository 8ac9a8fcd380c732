//! Ingestion adapter: raw transport deliveries in, validated events out.
//!
//! A [`RawInbound`] is whatever the transport hands us: maybe a message id,
//! maybe not, free-text subject and body. The adapter derives the dedup key,
//! extracts structured hints (capabilities, deadline, priority, effort) from
//! the text, and produces the normalized event plus the message record to
//! append. Validation failures stop here; nothing malformed reaches the
//! orchestrator.

use chrono::{DateTime, Utc};
use coverdesk_config::DedupSource;
use coverdesk_core::error::ValidationError;
use coverdesk_core::event::{EventKind, InboundRequestEvent};
use coverdesk_core::message::{Message, MessageId};
use coverdesk_core::task::Priority;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// One raw delivery from a transport, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInbound {
    /// Transport-supplied message id, when the transport has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Event kind as the transport labels it; empty means assignment request
    #[serde(default)]
    pub kind: String,

    pub from: String,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub body: String,

    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

/// Turns raw deliveries into `(Message, InboundRequestEvent)` pairs.
#[derive(Debug, Clone)]
pub struct IngestionAdapter {
    dedup_source: DedupSource,
    agent_address: String,
}

impl IngestionAdapter {
    pub fn new(dedup_source: DedupSource, agent_address: impl Into<String>) -> Self {
        Self {
            dedup_source,
            agent_address: agent_address.into(),
        }
    }

    /// Validate and normalize one raw delivery.
    pub fn ingest(&self, raw: &RawInbound) -> Result<(Message, InboundRequestEvent), ValidationError> {
        match raw.kind.as_str() {
            "" | "assignment_request" | "request" => {}
            other => return Err(ValidationError::UnknownEventKind(other.to_string())),
        }
        if raw.from.trim().is_empty() {
            return Err(ValidationError::MissingField("from"));
        }
        if raw.subject.trim().is_empty() && raw.body.trim().is_empty() {
            return Err(ValidationError::MalformedPayload(
                "subject and body are both empty".into(),
            ));
        }

        let dedup_key = self.dedup_key(raw);
        let description = if raw.body.trim().is_empty() {
            raw.subject.trim().to_string()
        } else {
            raw.body.trim().to_string()
        };

        let message = Message::incoming(
            MessageId::from(raw.message_id.clone().unwrap_or_else(|| dedup_key.clone())),
            raw.from.clone(),
            vec![self.agent_address.clone()],
            raw.subject.clone(),
            raw.body.clone(),
            raw.received_at,
        );

        let event = InboundRequestEvent {
            dedup_key: dedup_key.clone(),
            requester_address: raw.from.trim().to_string(),
            raw_subject: raw.subject.clone(),
            raw_description: description,
            requested_deadline: extract_deadline(&raw.body),
            capability_hints: extract_capabilities(&raw.body),
            priority: extract_priority(&raw.subject, &raw.body),
            estimated_hours: extract_hours(&raw.body),
            event_kind: EventKind::AssignmentRequest,
        };

        debug!(dedup_key = %event.dedup_key, from = %event.requester_address, "Ingested inbound request");
        Ok((message, event))
    }

    /// Derive the dedup key. With `MessageId` as the source, a delivery
    /// without a transport id falls back to the content hash.
    fn dedup_key(&self, raw: &RawInbound) -> String {
        match (self.dedup_source, &raw.message_id) {
            (DedupSource::MessageId, Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => content_hash(raw),
        }
    }
}

fn content_hash(raw: &RawInbound) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.from.trim().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(raw.subject.trim().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(raw.body.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── Free-text extraction ──────────────────────────────────────────────────

/// Pull capability hints from a `skills:` line plus level keywords found
/// anywhere in the body.
fn extract_capabilities(body: &str) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();

    for line in body.lines() {
        let lower = line.trim().to_lowercase();
        if let Some(rest) = lower
            .strip_prefix("skills:")
            .or_else(|| lower.strip_prefix("capabilities:"))
        {
            for skill in rest.split(',') {
                let skill = skill.trim().to_string();
                if !skill.is_empty() && !hints.contains(&skill) {
                    hints.push(skill);
                }
            }
        }
    }

    let lower_body = body.to_lowercase();
    for level in ["beginner", "intermediate", "advanced"] {
        if lower_body.contains(level) && !hints.iter().any(|h| h == level) {
            hints.push(level.to_string());
        }
    }

    hints
}

/// An RFC 3339 timestamp on a `deadline:` or `due:` line.
fn extract_deadline(body: &str) -> Option<DateTime<Utc>> {
    for line in body.lines() {
        let lower = line.trim().to_lowercase();
        let rest = match lower
            .strip_prefix("deadline:")
            .or_else(|| lower.strip_prefix("due:"))
        {
            Some(rest) => rest,
            None => continue,
        };
        return DateTime::parse_from_rfc3339(rest.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    None
}

fn extract_priority(subject: &str, body: &str) -> Priority {
    let text = format!("{} {}", subject.to_lowercase(), body.to_lowercase());
    if text.contains("urgent") || text.contains("asap") || text.contains("emergency") {
        Priority::Urgent
    } else if text.contains("important") || text.contains("high priority") {
        Priority::High
    } else if text.contains("low priority") || text.contains("whenever") {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Estimated effort from an `hours:` or `estimated hours:` line.
fn extract_hours(body: &str) -> Option<f64> {
    for line in body.lines() {
        let lower = line.trim().to_lowercase();
        if let Some(rest) = lower
            .strip_prefix("estimated hours:")
            .or_else(|| lower.strip_prefix("hours:"))
        {
            return rest.trim().parse().ok().filter(|h| *h > 0.0);
        }
    }
    None
}
