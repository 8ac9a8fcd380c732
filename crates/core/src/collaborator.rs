//! Collaborator traits — the boundaries to the optimizer, the text
//! generator, and the outbound transport.
//!
//! Every collaborator is consumed only through a request/response contract,
//! injected as an explicit dependency at construction (never a module
//! singleton), and validated at the boundary: a shape mismatch becomes a
//! [`CollaboratorError::MalformedResponse`], never untyped data flowing
//! inward.

use crate::context::MemoryContext;
use crate::error::CollaboratorError;
use crate::event::OutboundNotification;
use crate::roster::Candidate;
use crate::task::Task;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ── Optimizer ─────────────────────────────────────────────────────────────

/// One ranked candidate from the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChoice {
    /// Candidate name (matches `Candidate::name`)
    pub candidate: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Why the optimizer ranked them here
    pub rationale: String,
}

/// The optimizer's answer: a primary recommendation plus alternates.
/// `primary` is `None` when no roster candidate clears the hard
/// constraints — the orchestrator turns that into an explanatory decision,
/// never a fabricated assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<RankedChoice>,

    #[serde(default)]
    pub alternates: Vec<RankedChoice>,
}

/// The assignment-optimization collaborator.
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Human-readable name (e.g., "local", "http").
    fn name(&self) -> &str;

    /// Rank the roster against the task's requirements.
    async fn recommend(
        &self,
        task: &Task,
        roster: &[Candidate],
    ) -> Result<Recommendation, CollaboratorError>;
}

// ── Text generation ───────────────────────────────────────────────────────

/// The structured result of rendering a decision into natural language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDecision {
    /// The assignee the generator settled on. Normally the optimizer's
    /// primary; an override is legitimate but gets logged into the decision
    /// rationale by the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Reasoning text for the decision ledger
    pub rationale: String,

    /// Subject line for the outbound notification
    pub notification_subject: String,

    /// Body for the outbound notification
    pub notification_body: String,
}

/// The natural-language rendering collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name (e.g., "template", "llm").
    fn name(&self) -> &str;

    /// Render a decision and notification text from the assembled context
    /// and the optimizer's recommendation.
    async fn render(
        &self,
        context: &MemoryContext,
        task: &Task,
        recommendation: &Recommendation,
        roster: &[Candidate],
    ) -> Result<RenderedDecision, CollaboratorError>;
}

// ── Outbound transport ────────────────────────────────────────────────────

/// The outbound delivery collaborator. The gateway guarantees at-most-once
/// logical effect on top of this at-least-once boundary.
#[async_trait]
pub trait OutboundTransport: Send + Sync {
    /// Human-readable name (e.g., "console", "smtp").
    fn name(&self) -> &str;

    /// Deliver one notification. May be called again for the same
    /// notification after a failure; the gateway's idempotency ledger
    /// prevents re-sends after a confirmed delivery.
    async fn deliver(&self, notification: &OutboundNotification) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_without_primary_deserializes() {
        let json = r#"{ "alternates": [] }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert!(rec.primary.is_none());
        assert!(rec.alternates.is_empty());
    }

    #[test]
    fn ranked_choice_roundtrip() {
        let choice = RankedChoice {
            candidate: "ana".into(),
            confidence: 0.87,
            rationale: "excellent skill match".into(),
        };
        let json = serde_json::to_string(&choice).unwrap();
        let back: RankedChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.candidate, "ana");
        assert!((back.confidence - 0.87).abs() < f64::EPSILON);
    }
}
