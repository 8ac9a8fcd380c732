//! Task domain type — a unit of work needing assignment.
//!
//! Lifecycle: `pending → assigned → (completed | cancelled)`. Transitions are
//! strictly forward; the store rejects anything that would move a task
//! backward. A task row is never deleted, only status-transitioned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task urgency, used by the optimizer as a score multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Multiplier applied to candidate scores during optimization.
    pub fn weight(self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        write!(f, "{s}")
    }
}

/// Task lifecycle status. Ordering of the variants is the lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Whether the task is in a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Whether a transition to `next` moves the lifecycle forward.
    /// Transitioning to the same status is allowed (idempotent replays).
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Pending, Assigned) => true,
            (Pending, Cancelled) => true,
            (Assigned, Completed) | (Assigned, Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A unit of work needing assignment. Mutated only by the orchestrator,
/// through the store's conditional writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Generated, globally unique id
    pub id: TaskId,

    /// What needs doing
    pub description: String,

    /// Capabilities the assignee must hold
    #[serde(default)]
    pub required_capabilities: Vec<String>,

    /// Urgency
    #[serde(default)]
    pub priority: Priority,

    /// Optional hard deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    /// Estimated effort in hours, used for workload scoring
    #[serde(default = "default_estimated_hours")]
    pub estimated_hours: f64,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Address of whoever asked for this
    pub requester: String,

    /// Chosen assignee once assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Deduplication key that created this task (originating message id
    /// or content hash)
    pub dedup_key: String,

    /// Current assignment attempt, 1-based. Bumped on re-assignment.
    pub attempt: u32,

    /// Set when dispatch retries were exhausted after assignment; the task
    /// needs operator follow-up
    #[serde(default)]
    pub undelivered: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_estimated_hours() -> f64 {
    8.0
}

impl Task {
    /// Create a new pending task for the given dedup key.
    pub fn new(
        description: impl Into<String>,
        required_capabilities: Vec<String>,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
        requester: impl Into<String>,
        dedup_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            description: description.into(),
            required_capabilities,
            priority,
            deadline,
            estimated_hours: default_estimated_hours(),
            status: TaskStatus::Pending,
            requester: requester.into(),
            assignee: None,
            dedup_key: dedup_key.into(),
            attempt: 1,
            undelivered: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this task should appear in the hot tier.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// First 60 characters of the description, for notification subjects.
    /// Cuts on a character boundary; descriptions are free text and may
    /// carry multibyte characters anywhere.
    pub fn short_description(&self) -> &str {
        const SUBJECT_CHARS: usize = 60;
        let d = self.description.trim();
        match d.char_indices().nth(SUBJECT_CHARS) {
            Some((idx, _)) => &d[..idx],
            None => d,
        }
    }
}
