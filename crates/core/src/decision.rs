//! Decision — the immutable audit record of one assignment outcome.
//!
//! Exactly one decision exists per (task, attempt). Later corrections append
//! a new decision under the next attempt number; nothing is ever edited in
//! place.

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One assignment outcome, written exactly once per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The task this decision assigns
    pub task_id: TaskId,

    /// Which assignment attempt this decision belongs to (1-based)
    pub attempt: u32,

    /// Chosen assignee. `None` when no roster candidate qualified — the
    /// explanatory-notification path, never a fabricated assignment.
    pub assignee: Option<String>,

    /// Human-readable reasoning, including any text-generator override note
    pub rationale: String,

    /// Confidence in [0, 1]; 0 for the no-candidate case
    pub confidence: f64,

    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// A decision assigning the task to a candidate.
    pub fn assigned(
        task_id: TaskId,
        attempt: u32,
        assignee: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            task_id,
            attempt,
            assignee: Some(assignee.into()),
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
            decided_at: Utc::now(),
        }
    }

    /// A decision recording that nobody on the roster qualified.
    pub fn unassignable(task_id: TaskId, attempt: u32, rationale: impl Into<String>) -> Self {
        Self {
            task_id,
            attempt,
            assignee: None,
            rationale: rationale.into(),
            confidence: 0.0,
            decided_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_clamped_to_unit_interval() {
        let d = Decision::assigned(TaskId::generate(), 1, "bob", "good match", 1.7);
        assert_eq!(d.confidence, 1.0);
        let d = Decision::assigned(TaskId::generate(), 1, "bob", "poor match", -0.2);
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn unassignable_has_no_assignee_zero_confidence() {
        let d = Decision::unassignable(TaskId::generate(), 1, "nobody holds 'welding'");
        assert!(d.assignee.is_none());
        assert_eq!(d.confidence, 0.0);
        assert!(d.rationale.contains("welding"));
    }

    #[test]
    fn decision_roundtrip_preserves_fields() {
        let d = Decision::assigned(TaskId::generate(), 2, "carol", "skill match", 0.83);
        let json = serde_json::to_string(&d).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
