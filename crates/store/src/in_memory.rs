//! In-memory context store — keyed records behind a single RwLock.
//!
//! Every mutating method takes the write lock for its whole critical
//! section, which is what makes the conditional writes (task creation on
//! dedup key, decision append on (task, attempt), dispatch confirmation on
//! idempotency key) atomic with respect to concurrent orchestration runs.
//!
//! Tier boundaries are recomputed from timestamps on every read; nothing is
//! cached on the entities themselves.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use coverdesk_core::context::MemoryContext;
use coverdesk_core::decision::Decision;
use coverdesk_core::error::StoreError;
use coverdesk_core::identity::Identity;
use coverdesk_core::message::Message;
use coverdesk_core::roster::Candidate;
use coverdesk_core::store::{ContextStore, CreateOutcome, StoreStatus, Tier};
use coverdesk_core::task::{Task, TaskId, TaskStatus};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// A message plus its store bookkeeping. `seq` is the recency index the
/// hot window is ordered by; `stored_at` drives warm/cold demotion.
#[derive(Debug, Clone)]
struct StoredMessage {
    seq: u64,
    stored_at: DateTime<Utc>,
    message: Message,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    messages: Vec<StoredMessage>,
    message_ids: HashSet<String>,
    tasks: HashMap<TaskId, Task>,
    dedup_index: HashMap<String, TaskId>,
    decisions: BTreeMap<(TaskId, u32), Decision>,
    confirmed_dispatches: HashSet<String>,
}

/// The tiered in-memory store.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    hot_window: usize,
    warm_horizon: Duration,
}

impl InMemoryStore {
    /// Create a store with an explicit hot window and warm horizon.
    pub fn new(hot_window: usize, warm_horizon: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            hot_window,
            warm_horizon,
        }
    }

    /// Default tiering: 20-message hot window, 7-day warm horizon.
    pub fn with_defaults() -> Self {
        Self::new(20, Duration::days(7))
    }

    fn horizon_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.warm_horizon
    }

    /// Index of the first hot message in the (seq-ordered) message vec.
    fn hot_start(&self, total: usize) -> usize {
        total.saturating_sub(self.hot_window)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append_message(&self, message: Message) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.message_ids.insert(message.id.0.clone()) {
            debug!(message_id = %message.id, "Duplicate message id, append skipped");
            return Ok(false);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        debug!(seq, message_id = %message.id, "Message appended");
        inner.messages.push(StoredMessage {
            seq,
            stored_at: Utc::now(),
            message,
        });
        Ok(true)
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        let start = inner.messages.len().saturating_sub(limit);
        Ok(inner.messages[start..]
            .iter()
            .map(|s| s.message.clone())
            .collect())
    }

    async fn create_task_if_absent(&self, task: Task) -> Result<CreateOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing_id) = inner.dedup_index.get(&task.dedup_key) {
            let existing = inner
                .tasks
                .get(existing_id)
                .cloned()
                .ok_or_else(|| StoreError::UnknownTask(existing_id.to_string()))?;
            return Ok(CreateOutcome::Existing(existing));
        }
        inner
            .dedup_index
            .insert(task.dedup_key.clone(), task.id.clone());
        inner.tasks.insert(task.id.clone(), task.clone());
        debug!(task_id = %task.id, dedup_key = %task.dedup_key, "Task created");
        Ok(CreateOutcome::Created(task))
    }

    async fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.get(id).cloned())
    }

    async fn task_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .dedup_index
            .get(dedup_key)
            .and_then(|id| inner.tasks.get(id))
            .cloned())
    }

    async fn transition_task(
        &self,
        id: &TaskId,
        to: TaskStatus,
        assignee: Option<String>,
    ) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownTask(id.to_string()))?;
        if !task.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                task_id: id.to_string(),
                from: task.status.to_string(),
                to: to.to_string(),
            });
        }
        if task.status == to {
            // Idempotent replay of the same transition.
            return Ok(task.clone());
        }
        task.status = to;
        if assignee.is_some() {
            task.assignee = assignee;
        }
        task.updated_at = Utc::now();
        debug!(task_id = %id, status = %to, "Task transitioned");
        Ok(task.clone())
    }

    async fn mark_undelivered(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownTask(id.to_string()))?;
        task.undelivered = true;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn open_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut open: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.is_open())
            .cloned()
            .collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(open)
    }

    async fn record_decision(&self, decision: Decision) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (decision.task_id.clone(), decision.attempt);
        if inner.decisions.contains_key(&key) {
            return Err(StoreError::DuplicateDecision {
                task_id: decision.task_id.to_string(),
                attempt: decision.attempt,
            });
        }
        debug!(task_id = %decision.task_id, attempt = decision.attempt, "Decision recorded");
        inner.decisions.insert(key, decision);
        Ok(())
    }

    async fn decision(
        &self,
        task_id: &TaskId,
        attempt: u32,
    ) -> Result<Option<Decision>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.decisions.get(&(task_id.clone(), attempt)).cloned())
    }

    async fn decisions_for_task(&self, task_id: &TaskId) -> Result<Vec<Decision>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .decisions
            .range((task_id.clone(), 0)..=(task_id.clone(), u32::MAX))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn dispatch_confirmed(&self, idempotency_key: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .confirmed_dispatches
            .contains(idempotency_key))
    }

    async fn confirm_dispatch(&self, idempotency_key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.confirmed_dispatches.insert(idempotency_key.into()))
    }

    async fn build_memory_context(
        &self,
        identity: &Identity,
        roster: &[Candidate],
        now: DateTime<Utc>,
    ) -> Result<MemoryContext, StoreError> {
        let inner = self.inner.read().await;
        let cutoff = self.horizon_cutoff(now);

        let hot_start = self.hot_start(inner.messages.len());
        let hot: &[StoredMessage] = &inner.messages[hot_start..];
        let recent_messages: Vec<Message> = hot.iter().map(|s| s.message.clone()).collect();

        let mut open_tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.is_open())
            .cloned()
            .collect();
        open_tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut recent_decisions: Vec<Decision> = inner
            .decisions
            .values()
            .filter(|d| d.decided_at >= cutoff)
            .cloned()
            .collect();
        recent_decisions.sort_by(|a, b| a.decided_at.cmp(&b.decided_at));

        // Warm tier also carries any roster candidate mentioned in a
        // hot-tier message stored within the horizon.
        let known_candidates: Vec<Candidate> = roster
            .iter()
            .filter(|c| {
                let needle = c.name.to_lowercase();
                hot.iter().any(|s| {
                    s.stored_at >= cutoff
                        && (s.message.body.to_lowercase().contains(&needle)
                            || s.message.subject.to_lowercase().contains(&needle))
                })
            })
            .cloned()
            .collect();

        Ok(MemoryContext {
            self_description: identity.self_description.clone(),
            recent_messages,
            open_tasks,
            recent_decisions,
            known_candidates,
        })
    }

    async fn status(&self, now: DateTime<Utc>) -> Result<StoreStatus, StoreError> {
        let inner = self.inner.read().await;
        let cutoff = self.horizon_cutoff(now);

        let total = inner.messages.len();
        let hot_start = self.hot_start(total);
        let hot = &inner.messages[hot_start..];

        let mut warm_messages = 0;
        let mut cold_messages = 0;
        for (i, stored) in inner.messages.iter().enumerate() {
            match Tier::classify(i >= hot_start, stored.stored_at, cutoff) {
                Tier::Hot => {}
                Tier::Warm => warm_messages += 1,
                Tier::Cold => cold_messages += 1,
            }
        }

        let open_tasks = inner.tasks.values().filter(|t| t.is_open()).count();
        let terminal_tasks = inner.tasks.len() - open_tasks;

        let warm_decisions = inner
            .decisions
            .values()
            .filter(|d| d.decided_at >= cutoff)
            .count();
        let cold_decisions = inner.decisions.len() - warm_decisions;

        Ok(StoreStatus {
            hot_messages: hot.len(),
            warm_messages,
            cold_messages,
            open_tasks,
            terminal_tasks,
            warm_decisions,
            cold_decisions,
            confirmed_dispatches: inner.confirmed_dispatches.len(),
            oldest_hot_timestamp: hot.first().map(|s| s.stored_at),
            newest_hot_timestamp: hot.last().map(|s| s.stored_at),
        })
    }

    async fn compact(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let cutoff = self.horizon_cutoff(now);
        let mut dropped = 0;

        // Messages: drop cold ones, but never shrink into the hot window.
        // Ids stay registered so a late duplicate delivery is still a no-op.
        let hot_start = self.hot_start(inner.messages.len());
        let hot_min_seq = inner.messages.get(hot_start).map(|s| s.seq);
        let before = inner.messages.len();
        let mut kept = Vec::with_capacity(before);
        for stored in inner.messages.drain(..) {
            let in_hot_window = hot_min_seq.is_some_and(|min| stored.seq >= min);
            if !in_hot_window && stored.stored_at < cutoff {
                continue;
            }
            kept.push(stored);
        }
        dropped += before - kept.len();
        inner.messages = kept;

        // Decisions past the horizon are expired. Tasks are never deleted.
        let before = inner.decisions.len();
        inner.decisions.retain(|_, d| d.decided_at >= cutoff);
        dropped += before - inner.decisions.len();

        if dropped > 0 {
            debug!(dropped, "Compacted cold-tier records");
        }
        Ok(dropped)
    }
}
