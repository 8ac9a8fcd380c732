//! Message domain type — one inbound or outbound communication.
//!
//! Messages are immutable once stored. The context store assigns each one a
//! store sequence number on append; the hot-tier window is ordered by that
//! sequence, never by the claimed timestamp (clocks on the sending side are
//! not trusted for ordering).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a message. Source-assigned when the transport
/// provides one, generated otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a message came into the system or left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A single communication, incoming or outgoing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,

    /// Incoming or outgoing
    pub direction: Direction,

    /// Sender address
    pub from: String,

    /// Recipient addresses
    pub to: Vec<String>,

    /// Subject line
    pub subject: String,

    /// Body text
    pub body: String,

    /// Timestamp claimed by the source (incoming) or set at send (outgoing)
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create an incoming message.
    pub fn incoming(
        id: MessageId,
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            direction: Direction::Incoming,
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
            timestamp,
        }
    }

    /// Create an outgoing message with a generated id, timestamped now.
    pub fn outgoing(
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            direction: Direction::Outgoing,
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_message_keeps_source_id() {
        let msg = Message::incoming(
            MessageId::from("smtp-4711"),
            "alice@example.com",
            vec!["desk@example.com".into()],
            "Need cover",
            "Thursday evening class",
            Utc::now(),
        );
        assert_eq!(msg.id.0, "smtp-4711");
        assert_eq!(msg.direction, Direction::Incoming);
    }

    #[test]
    fn outgoing_message_gets_generated_id() {
        let msg = Message::outgoing(
            "desk@example.com",
            vec!["bob@example.com".into()],
            "Assignment",
            "You're on for Thursday.",
        );
        assert!(!msg.id.0.is_empty());
        assert_eq!(msg.direction, Direction::Outgoing);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::outgoing("a@x", vec!["b@x".into()], "s", "b");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, msg.id);
        assert_eq!(back.subject, "s");
    }
}
