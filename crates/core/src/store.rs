//! ContextStore trait — tiered memory over keyed records.
//!
//! Three logical tiers over the same underlying storage, distinguished by
//! retention and retrieval cost, not by separate physical stores:
//!
//! - **Hot**: the N most recently stored messages plus all non-terminal
//!   tasks. Always in the memory context.
//! - **Warm**: decisions within a trailing horizon, plus candidates
//!   mentioned in hot messages. Included in the memory context by default.
//! - **Cold**: everything older. Explicit lookup only; eligible for
//!   time-based expiry via `compact`.
//!
//! Tier membership is computed at read time from `now` and the entity's
//! timestamp; nothing caches "which tier am I in" on the entity itself.
//!
//! The store is the only shared mutable resource in the system. All mutation
//! goes through conditional writes: task creation is compare-and-set on the
//! dedup key, decision append is compare-and-set on (task id, attempt),
//! dispatch confirmation is compare-and-set on the idempotency key, and
//! message append is idempotent on the message id.

use crate::context::MemoryContext;
use crate::decision::Decision;
use crate::error::StoreError;
use crate::identity::Identity;
use crate::message::Message;
use crate::roster::Candidate;
use crate::task::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retention class of a memory entity, derived from recency at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl Tier {
    /// Classify a record by recency. Hot membership is positional (the
    /// recency window), so the caller passes it in; everything else splits
    /// on the warm-horizon cutoff.
    pub fn classify(
        in_hot_window: bool,
        stored_at: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Self {
        if in_hot_window {
            Tier::Hot
        } else if stored_at >= cutoff {
            Tier::Warm
        } else {
            Tier::Cold
        }
    }
}

/// Outcome of a conditional task creation.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// This call won the race and created the task.
    Created(Task),
    /// A task already existed for the dedup key; here it is.
    Existing(Task),
}

impl CreateOutcome {
    /// The task, whichever way the race went.
    pub fn into_task(self) -> Task {
        match self {
            CreateOutcome::Created(t) | CreateOutcome::Existing(t) => t,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Store-derived counters for operational visibility. Not part of the
/// assignment logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    /// Messages inside the recency window.
    pub hot_messages: usize,
    /// Messages outside the window but inside the warm horizon.
    pub warm_messages: usize,
    /// Messages past the warm horizon. The three message counters sum to
    /// the stored total.
    pub cold_messages: usize,
    pub open_tasks: usize,
    pub terminal_tasks: usize,
    pub warm_decisions: usize,
    pub cold_decisions: usize,
    pub confirmed_dispatches: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_hot_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_hot_timestamp: Option<DateTime<Utc>>,
}

/// The tiered memory store. Implementations must make every mutating method
/// atomic with respect to concurrent callers.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    // ── Messages ──

    /// Append a message. Idempotent on the message id: returns `false`
    /// without storing anything when the id was seen before.
    async fn append_message(&self, message: Message) -> Result<bool, StoreError>;

    /// The N most recently stored messages, oldest first, ordered by store
    /// sequence (not claimed timestamp).
    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError>;

    // ── Tasks ──

    /// Create the task unless one already exists for its dedup key.
    /// Exactly one concurrent caller wins; everyone observes the same task.
    async fn create_task_if_absent(&self, task: Task) -> Result<CreateOutcome, StoreError>;

    async fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    async fn task_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Task>, StoreError>;

    /// Move a task forward through its lifecycle, optionally setting the
    /// assignee. Rejects backward moves with `InvalidTransition`;
    /// transitioning to the current status is a no-op replay.
    async fn transition_task(
        &self,
        id: &TaskId,
        to: TaskStatus,
        assignee: Option<String>,
    ) -> Result<Task, StoreError>;

    /// Flag an assigned task whose notification could not be delivered.
    async fn mark_undelivered(&self, id: &TaskId) -> Result<(), StoreError>;

    /// All tasks not in a terminal state.
    async fn open_tasks(&self) -> Result<Vec<Task>, StoreError>;

    // ── Decision ledger ──

    /// Append a decision. Fails with `DuplicateDecision` if one already
    /// exists for the (task, attempt) pair — the mechanism behind
    /// "resume, don't redo".
    async fn record_decision(&self, decision: Decision) -> Result<(), StoreError>;

    async fn decision(&self, task_id: &TaskId, attempt: u32)
        -> Result<Option<Decision>, StoreError>;

    /// Full decision history for a task, oldest attempt first. Reaches into
    /// the cold tier; meant for reporting, not the per-run context.
    async fn decisions_for_task(&self, task_id: &TaskId) -> Result<Vec<Decision>, StoreError>;

    // ── Dispatch ledger ──

    /// Whether a dispatch with this idempotency key was already confirmed.
    async fn dispatch_confirmed(&self, idempotency_key: &str) -> Result<bool, StoreError>;

    /// Confirm a dispatch. Returns `false` when another caller confirmed
    /// the same key first.
    async fn confirm_dispatch(&self, idempotency_key: &str) -> Result<bool, StoreError>;

    // ── Projections ──

    /// Assemble the memory context: self-description + hot tier + warm
    /// tier. Reflects all writes committed before the call started.
    async fn build_memory_context(
        &self,
        identity: &Identity,
        roster: &[Candidate],
        now: DateTime<Utc>,
    ) -> Result<MemoryContext, StoreError>;

    /// Tier counters for the health/status query.
    async fn status(&self, now: DateTime<Utc>) -> Result<StoreStatus, StoreError>;

    /// Expire cold-tier messages and decisions past the retention horizon.
    /// Tasks are never deleted. Returns how many records were dropped.
    /// Optional for correctness — tiering never depends on it — but keeps
    /// storage growth bounded.
    async fn compact(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
