//! Assignment orchestrator — the only component that runs the full
//! pipeline for an inbound request.
//!
//! Per event: append the inbound message, create the task conditionally on
//! its dedup key, consult the optimizer and the text generator, transition
//! the task, append the decision, dispatch. Every write is conditional, so
//! a duplicate delivery of the same event resumes at the first incomplete
//! step instead of redoing completed ones:
//!
//! - task exists for the dedup key: reuse it
//! - decision exists for the current attempt: skip straight to dispatch
//! - dispatch confirmed for (task, attempt): nothing left to do
//!
//! Collaborator consultations happen between the conditional writes and are
//! themselves retried with bounded backoff; a crash between the decision
//! append and the dispatch confirmation re-sends at most one notification.

use std::sync::Arc;

use chrono::Utc;
use coverdesk_config::{CollaboratorPolicy, CollaboratorsConfig};
use coverdesk_core::collaborator::{Optimizer, OutboundTransport, Recommendation, TextGenerator};
use coverdesk_core::decision::Decision;
use coverdesk_core::error::{OrchestrationError, StoreError};
use coverdesk_core::event::{InboundRequestEvent, OutboundNotification};
use coverdesk_core::message::Message;
use coverdesk_core::roster::{Candidate, RosterSource};
use coverdesk_core::store::ContextStore;
use coverdesk_core::task::{Task, TaskStatus};
use coverdesk_core::Identity;
use coverdesk_providers::call_with_retry;
use tracing::{info, warn};

use crate::dispatch::{DispatchGateway, DispatchOutcome};

/// What one `handle` call did.
#[derive(Debug)]
pub struct OrchestrationOutcome {
    /// The task after this run, in its latest stored state
    pub task: Task,

    /// The decision governing the current attempt, if one exists
    pub decision: Option<Decision>,

    /// Outcome of the dispatch step, when one ran
    pub dispatch: Option<DispatchOutcome>,

    /// True when this delivery found existing progress and resumed
    pub resumed: bool,
}

/// The pipeline driver. Every dependency is injected as a trait object.
pub struct Orchestrator {
    store: Arc<dyn ContextStore>,
    optimizer: Arc<dyn Optimizer>,
    text_generator: Arc<dyn TextGenerator>,
    roster: Arc<dyn RosterSource>,
    gateway: DispatchGateway,
    identity: Identity,
    optimizer_policy: CollaboratorPolicy,
    text_generator_policy: CollaboratorPolicy,
    roster_policy: CollaboratorPolicy,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ContextStore>,
        optimizer: Arc<dyn Optimizer>,
        text_generator: Arc<dyn TextGenerator>,
        roster: Arc<dyn RosterSource>,
        transport: Arc<dyn OutboundTransport>,
        identity: Identity,
        policies: &CollaboratorsConfig,
    ) -> Self {
        let gateway = DispatchGateway::new(
            store.clone(),
            transport,
            identity.clone(),
            policies.transport.clone(),
        );
        Self {
            store,
            optimizer,
            text_generator,
            roster,
            gateway,
            identity,
            optimizer_policy: policies.optimizer.clone(),
            text_generator_policy: policies.text_generator.clone(),
            roster_policy: policies.roster.clone(),
        }
    }

    /// Run the pipeline for one inbound delivery.
    pub async fn handle(
        &self,
        message: Message,
        event: InboundRequestEvent,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let newly_logged = self.store.append_message(message).await?;
        if !newly_logged {
            info!(dedup_key = %event.dedup_key, "Duplicate delivery of a known message");
        }

        let outcome = self
            .store
            .create_task_if_absent(task_from_event(&event))
            .await?;
        let resumed = !outcome.was_created();
        let task = outcome.into_task();

        if task.status.is_terminal() {
            info!(task_id = %task.id, status = %task.status, "Task already settled, nothing to do");
            let decision = self.store.decision(&task.id, task.attempt).await?;
            return Ok(OrchestrationOutcome {
                task,
                decision,
                dispatch: None,
                resumed: true,
            });
        }

        if let Some(existing) = self.store.decision(&task.id, task.attempt).await? {
            info!(
                task_id = %task.id,
                attempt = task.attempt,
                "Decision already recorded, resuming at dispatch"
            );
            return self.resume_dispatch(task, existing).await;
        }

        self.decide_and_dispatch(task, resumed).await
    }

    // ── Fresh decision path ───────────────────────────────────────────────

    async fn decide_and_dispatch(
        &self,
        task: Task,
        resumed: bool,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let roster = self.fetch_roster().await?;
        let context = self
            .store
            .build_memory_context(&self.identity, &roster, Utc::now())
            .await?;

        let recommendation = call_with_retry(self.optimizer.name(), &self.optimizer_policy, || {
            self.optimizer.recommend(&task, &roster)
        })
        .await?;

        let rendered = call_with_retry(
            self.text_generator.name(),
            &self.text_generator_policy,
            || {
                self.text_generator
                    .render(&context, &task, &recommendation, &roster)
            },
        )
        .await?;

        let primary_name = recommendation.primary.as_ref().map(|p| p.candidate.clone());
        let mut rationale = rendered.rationale.clone();
        if rendered.assignee != primary_name {
            warn!(
                task_id = %task.id,
                recommended = primary_name.as_deref().unwrap_or("nobody"),
                chosen = rendered.assignee.as_deref().unwrap_or("nobody"),
                "Text generator overrode the optimizer recommendation"
            );
            rationale = format!(
                "{rationale} (overrides optimizer recommendation: {})",
                primary_name.as_deref().unwrap_or("nobody")
            );
        }

        match rendered.assignee {
            None => {
                // Nobody qualifies: record the outcome, explain to the
                // requester, leave the task pending.
                let decision = Decision::unassignable(task.id.clone(), task.attempt, rationale);
                let (decision, from_race) = self.record_or_adopt(decision).await?;

                let notification = if from_race {
                    self.notification_from_decision(&task, &decision, &roster)
                } else {
                    OutboundNotification {
                        idempotency_key: OutboundNotification::idempotency_key_for(
                            &task.id,
                            task.attempt,
                        ),
                        to_addresses: vec![task.requester.clone()],
                        cc_addresses: vec![],
                        subject: rendered.notification_subject,
                        body: rendered.notification_body,
                        related_task_id: task.id.clone(),
                    }
                };

                let dispatch = self.gateway.send(&notification).await?;
                let task = self.refetch(task).await?;
                Ok(OrchestrationOutcome {
                    task,
                    decision: Some(decision),
                    dispatch: Some(dispatch),
                    resumed,
                })
            }
            Some(assignee) => {
                let task = self
                    .store
                    .transition_task(&task.id, TaskStatus::Assigned, Some(assignee.clone()))
                    .await?;

                let confidence = confidence_for(&assignee, &recommendation);
                let decision = Decision::assigned(
                    task.id.clone(),
                    task.attempt,
                    assignee.clone(),
                    rationale,
                    confidence,
                );
                let (decision, from_race) = self.record_or_adopt(decision).await?;

                let notification = if from_race {
                    self.notification_from_decision(&task, &decision, &roster)
                } else {
                    OutboundNotification {
                        idempotency_key: OutboundNotification::idempotency_key_for(
                            &task.id,
                            task.attempt,
                        ),
                        to_addresses: vec![address_for(&roster, &assignee)],
                        cc_addresses: vec![task.requester.clone()],
                        subject: rendered.notification_subject,
                        body: rendered.notification_body,
                        related_task_id: task.id.clone(),
                    }
                };

                info!(
                    task_id = %task.id,
                    assignee = %assignee,
                    confidence,
                    "Assignment decided"
                );

                let dispatch = self.gateway.send(&notification).await?;
                let task = self.refetch(task).await?;
                Ok(OrchestrationOutcome {
                    task,
                    decision: Some(decision),
                    dispatch: Some(dispatch),
                    resumed,
                })
            }
        }
    }

    // ── Resume path ───────────────────────────────────────────────────────

    /// A decision already governs this attempt; only dispatch may be
    /// outstanding.
    async fn resume_dispatch(
        &self,
        task: Task,
        decision: Decision,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let key = OutboundNotification::idempotency_key_for(&task.id, task.attempt);
        if self.store.dispatch_confirmed(&key).await? {
            return Ok(OrchestrationOutcome {
                task,
                decision: Some(decision),
                dispatch: Some(DispatchOutcome::AlreadyConfirmed),
                resumed: true,
            });
        }

        let roster = if decision.assignee.is_some() {
            self.fetch_roster().await?
        } else {
            Vec::new()
        };
        let notification = self.notification_from_decision(&task, &decision, &roster);
        let dispatch = self.gateway.send(&notification).await?;
        let task = self.refetch(task).await?;
        Ok(OrchestrationOutcome {
            task,
            decision: Some(decision),
            dispatch: Some(dispatch),
            resumed: true,
        })
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    async fn fetch_roster(&self) -> Result<Vec<Candidate>, OrchestrationError> {
        call_with_retry(self.roster.name(), &self.roster_policy, || {
            self.roster.roster()
        })
        .await
    }

    /// Append the decision, or adopt the one that won a concurrent race.
    /// Returns the authoritative decision and whether it came from the race.
    async fn record_or_adopt(
        &self,
        decision: Decision,
    ) -> Result<(Decision, bool), OrchestrationError> {
        match self.store.record_decision(decision.clone()).await {
            Ok(()) => Ok((decision, false)),
            Err(StoreError::DuplicateDecision { .. }) => {
                info!(
                    task_id = %decision.task_id,
                    attempt = decision.attempt,
                    "Concurrent decision won the race, adopting it"
                );
                let winner = self
                    .store
                    .decision(&decision.task_id, decision.attempt)
                    .await?
                    .unwrap_or(decision);
                Ok((winner, true))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rebuild the notification deterministically from a stored decision.
    /// Used on resume and after losing a decision race, when the original
    /// rendered text is gone.
    fn notification_from_decision(
        &self,
        task: &Task,
        decision: &Decision,
        roster: &[Candidate],
    ) -> OutboundNotification {
        let key = OutboundNotification::idempotency_key_for(&task.id, task.attempt);
        let short = task.short_description();

        match &decision.assignee {
            Some(assignee) => OutboundNotification {
                idempotency_key: key,
                to_addresses: vec![address_for(roster, assignee)],
                cc_addresses: vec![task.requester.clone()],
                subject: format!("Coverage assigned: {short}"),
                body: format!(
                    "Hi {assignee},\n\nYou have been assigned: {}\nRequested by: {}\n\nWhy you: {}.\n",
                    task.description, task.requester, decision.rationale
                ),
                related_task_id: task.id.clone(),
            },
            None => OutboundNotification {
                idempotency_key: key,
                to_addresses: vec![task.requester.clone()],
                cc_addresses: vec![],
                subject: format!("Unable to assign: {short}"),
                body: format!(
                    "Hi {},\n\nNobody on the current roster can take this request:\n{}\n\n{}.\nThe request stays open.\n",
                    task.requester, task.description, decision.rationale
                ),
                related_task_id: task.id.clone(),
            },
        }
    }

    async fn refetch(&self, task: Task) -> Result<Task, OrchestrationError> {
        Ok(self.store.task(&task.id).await?.unwrap_or(task))
    }
}

fn task_from_event(event: &InboundRequestEvent) -> Task {
    let mut task = Task::new(
        event.raw_description.clone(),
        event.capability_hints.clone(),
        event.priority,
        event.requested_deadline,
        event.requester_address.clone(),
        event.dedup_key.clone(),
    );
    if let Some(hours) = event.estimated_hours {
        task.estimated_hours = hours;
    }
    task
}

/// Confidence for the final assignee: the optimizer's number when they were
/// recommended, a conservative default when the text generator overrode.
fn confidence_for(assignee: &str, recommendation: &Recommendation) -> f64 {
    if let Some(primary) = &recommendation.primary
        && primary.candidate == assignee
    {
        return primary.confidence;
    }
    recommendation
        .alternates
        .iter()
        .find(|a| a.candidate == assignee)
        .map(|a| a.confidence)
        .unwrap_or(0.5)
}

fn address_for(roster: &[Candidate], name: &str) -> String {
    roster
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.address.clone())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coverdesk_core::collaborator::RenderedDecision;
    use coverdesk_core::context::MemoryContext;
    use coverdesk_core::error::CollaboratorError;
    use coverdesk_core::event::EventKind;
    use coverdesk_core::message::MessageId;
    use coverdesk_core::roster::{Availability, StaticRoster};
    use coverdesk_core::task::Priority;
    use coverdesk_providers::TemplateTextGenerator;
    use coverdesk_solver::LocalSolver;
    use coverdesk_store::InMemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────

    struct CountingTransport {
        deliveries: AtomicU32,
        sent: Mutex<Vec<OutboundNotification>>,
    }

    impl CountingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                deliveries: AtomicU32::new(0),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> u32 {
            self.deliveries.load(Ordering::SeqCst)
        }

        fn last(&self) -> OutboundNotification {
            self.sent.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundTransport for CountingTransport {
        fn name(&self) -> &str {
            "counting"
        }

        async fn deliver(
            &self,
            notification: &OutboundNotification,
        ) -> Result<(), CollaboratorError> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    /// Fails the first `failures` calls, then delegates to the real solver.
    struct FlakyOptimizer {
        inner: LocalSolver,
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl FlakyOptimizer {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                inner: LocalSolver::new(),
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Optimizer for FlakyOptimizer {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn recommend(
            &self,
            task: &Task,
            roster: &[Candidate],
        ) -> Result<Recommendation, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(CollaboratorError::Unavailable {
                    collaborator: "flaky".into(),
                    reason: "connection reset".into(),
                });
            }
            self.inner.recommend(task, roster).await
        }
    }

    /// Always picks a fixed assignee, whatever the optimizer said.
    struct OverridingTextGen {
        pick: String,
    }

    #[async_trait]
    impl TextGenerator for OverridingTextGen {
        fn name(&self) -> &str {
            "overriding"
        }

        async fn render(
            &self,
            _context: &MemoryContext,
            _task: &Task,
            _recommendation: &Recommendation,
            _roster: &[Candidate],
        ) -> Result<RenderedDecision, CollaboratorError> {
            Ok(RenderedDecision {
                assignee: Some(self.pick.clone()),
                rationale: "knows this group well".into(),
                notification_subject: "Coverage assigned".into(),
                notification_body: "Hi".into(),
            })
        }
    }

    // ── Harness ───────────────────────────────────────────────────────────

    fn fast_policies() -> CollaboratorsConfig {
        let p = CollaboratorPolicy {
            timeout_secs: 2,
            max_attempts: 3,
            backoff_base_ms: 1,
        };
        CollaboratorsConfig {
            optimizer: p.clone(),
            text_generator: p.clone(),
            roster: p.clone(),
            transport: p,
            ..Default::default()
        }
    }

    fn candidate(name: &str, caps: &[&str], load: f64) -> Candidate {
        Candidate {
            name: name.into(),
            address: format!("{name}@example.com"),
            capabilities: caps.iter().map(|c| c.to_string()).collect(),
            current_load: load,
            max_hours: 40.0,
            availability: Availability::Available,
        }
    }

    fn roster() -> Arc<StaticRoster> {
        Arc::new(StaticRoster::new(vec![
            candidate("ana", &["conversation", "grammar"], 10.0),
            candidate("bruno", &["grammar"], 5.0),
        ]))
    }

    fn event(dedup_key: &str, skills: &[&str]) -> InboundRequestEvent {
        InboundRequestEvent {
            dedup_key: dedup_key.into(),
            requester_address: "alice@example.com".into(),
            raw_subject: "Need cover".into(),
            raw_description: "cover Thursday conversation class".into(),
            requested_deadline: None,
            capability_hints: skills.iter().map(|s| s.to_string()).collect(),
            priority: Priority::Medium,
            estimated_hours: Some(2.0),
            event_kind: EventKind::AssignmentRequest,
        }
    }

    fn inbound(dedup_key: &str) -> Message {
        Message::incoming(
            MessageId::from(dedup_key),
            "alice@example.com",
            vec!["coverdesk@localhost".into()],
            "Need cover",
            "cover Thursday conversation class",
            Utc::now(),
        )
    }

    fn orchestrator(
        store: Arc<InMemoryStore>,
        optimizer: Arc<dyn Optimizer>,
        transport: Arc<CountingTransport>,
    ) -> Orchestrator {
        Orchestrator::new(
            store,
            optimizer,
            Arc::new(TemplateTextGenerator::new()),
            roster(),
            transport,
            Identity::default(),
            &fast_policies(),
        )
    }

    // ── Scenarios ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn happy_path_assigns_and_notifies() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = orchestrator(store.clone(), Arc::new(LocalSolver::new()), transport.clone());

        let outcome = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();

        assert_eq!(outcome.task.status, TaskStatus::Assigned);
        assert_eq!(outcome.task.assignee.as_deref(), Some("ana"));
        assert!(!outcome.resumed);
        assert_eq!(outcome.dispatch, Some(DispatchOutcome::Delivered));

        let decision = outcome.decision.unwrap();
        assert_eq!(decision.assignee.as_deref(), Some("ana"));
        assert!(decision.confidence > 0.5);

        assert_eq!(transport.count(), 1);
        let sent = transport.last();
        assert_eq!(sent.to_addresses, vec!["ana@example.com".to_string()]);
        assert_eq!(sent.cc_addresses, vec!["alice@example.com".to_string()]);

        // Inbound and outgoing both land in the message log.
        let messages = store.recent_messages(10).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn no_qualifying_candidate_leaves_task_pending() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = orchestrator(store.clone(), Arc::new(LocalSolver::new()), transport.clone());

        let outcome = orch
            .handle(inbound("m-1"), event("m-1", &["welding"]))
            .await
            .unwrap();

        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert!(outcome.task.assignee.is_none());

        let decision = outcome.decision.unwrap();
        assert!(decision.assignee.is_none());
        assert_eq!(decision.confidence, 0.0);

        // The requester gets the explanation.
        let sent = transport.last();
        assert_eq!(sent.to_addresses, vec!["alice@example.com".to_string()]);
        assert!(sent.subject.starts_with("Unable to assign"));
    }

    #[tokio::test]
    async fn duplicate_delivery_yields_one_of_everything() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = orchestrator(store.clone(), Arc::new(LocalSolver::new()), transport.clone());

        let first = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();
        let second = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();

        assert_eq!(first.task.id, second.task.id);
        assert!(second.resumed);
        assert_eq!(second.dispatch, Some(DispatchOutcome::AlreadyConfirmed));
        assert_eq!(transport.count(), 1);

        let decisions = store.decisions_for_task(&first.task.id).await.unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(store.open_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flaky_optimizer_recovers_within_retry_budget() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let optimizer = FlakyOptimizer::new(2);
        let orch = orchestrator(store.clone(), optimizer.clone(), transport.clone());

        let outcome = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();

        assert_eq!(optimizer.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.task.status, TaskStatus::Assigned);
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn exhausted_optimizer_leaves_no_partial_state() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let optimizer = FlakyOptimizer::new(10);
        let orch = orchestrator(store.clone(), optimizer, transport.clone());

        let err = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::CollaboratorExhausted { attempts: 3, .. }
        ));

        // Task exists but stayed pending; no decision, no dispatch.
        let task = store.task_by_dedup_key("m-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(store
            .decisions_for_task(&task.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn crash_after_decision_resumes_at_dispatch() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = orchestrator(store.clone(), Arc::new(LocalSolver::new()), transport.clone());

        // Simulate a crash that happened after the decision append but
        // before dispatch: task assigned, decision on the ledger, nothing
        // confirmed.
        let task = store
            .create_task_if_absent(task_from_event(&event("m-1", &["conversation"])))
            .await
            .unwrap()
            .into_task();
        store
            .transition_task(&task.id, TaskStatus::Assigned, Some("ana".into()))
            .await
            .unwrap();
        let recorded = Decision::assigned(task.id.clone(), 1, "ana", "good skill match", 0.8);
        store.record_decision(recorded.clone()).await.unwrap();

        let outcome = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();

        assert!(outcome.resumed);
        assert_eq!(outcome.dispatch, Some(DispatchOutcome::Delivered));
        assert_eq!(outcome.decision.unwrap(), recorded);
        assert_eq!(transport.count(), 1);
        assert_eq!(
            store.decisions_for_task(&task.id).await.unwrap().len(),
            1
        );
        assert_eq!(
            transport.last().to_addresses,
            vec!["ana@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn concurrent_duplicates_converge_on_one_task() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = orchestrator(store.clone(), Arc::new(LocalSolver::new()), transport.clone());

        let (a, b) = tokio::join!(
            orch.handle(inbound("m-1"), event("m-1", &["conversation"])),
            orch.handle(inbound("m-1"), event("m-1", &["conversation"])),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.task.id, b.task.id);
        assert_eq!(store.open_tasks().await.unwrap().len(), 1);
        assert_eq!(
            store.decisions_for_task(&a.task.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn text_generator_override_is_recorded() {
        let store = Arc::new(InMemoryStore::with_defaults());
        let transport = CountingTransport::new();
        let orch = Orchestrator::new(
            store.clone(),
            Arc::new(LocalSolver::new()),
            Arc::new(OverridingTextGen {
                pick: "bruno".into(),
            }),
            roster(),
            transport.clone(),
            Identity::default(),
            &fast_policies(),
        );

        // The solver would pick ana for a conversation class; the generator
        // insists on bruno.
        let outcome = orch
            .handle(inbound("m-1"), event("m-1", &["conversation"]))
            .await
            .unwrap();

        assert_eq!(outcome.task.assignee.as_deref(), Some("bruno"));
        let decision = outcome.decision.unwrap();
        assert_eq!(decision.assignee.as_deref(), Some("bruno"));
        assert!(decision.rationale.contains("overrides optimizer recommendation"));
        assert_eq!(
            transport.last().to_addresses,
            vec!["bruno@example.com".to_string()]
        );
    }
}
