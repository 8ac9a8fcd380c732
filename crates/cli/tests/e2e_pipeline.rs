//! End-to-end pipeline test: raw deliveries through ingestion,
//! orchestration, and dispatch, with the wiring the binary uses.

use std::sync::Arc;

use chrono::Utc;
use coverdesk_agent::Orchestrator;
use coverdesk_channels::{ConsoleTransport, IngestionAdapter, RawInbound};
use coverdesk_config::{AppConfig, DedupSource};
use coverdesk_core::roster::{Availability, Candidate, StaticRoster};
use coverdesk_core::store::ContextStore;
use coverdesk_core::task::TaskStatus;
use coverdesk_core::Identity;
use coverdesk_providers::TemplateTextGenerator;
use coverdesk_solver::LocalSolver;
use coverdesk_store::InMemoryStore;

fn delivery(message_id: &str, body: &str) -> RawInbound {
    serde_json::from_value(serde_json::json!({
        "message_id": message_id,
        "from": "alice@example.com",
        "subject": "Need cover",
        "body": body,
        "received_at": Utc::now().to_rfc3339(),
    }))
    .unwrap()
}

fn wire() -> (Arc<InMemoryStore>, IngestionAdapter, Orchestrator) {
    let config = AppConfig::default();
    let store = Arc::new(InMemoryStore::with_defaults());
    let roster = StaticRoster::new(vec![
        Candidate {
            name: "ana".into(),
            address: "ana@example.com".into(),
            capabilities: vec!["conversation".into()],
            current_load: 10.0,
            max_hours: 40.0,
            availability: Availability::Available,
        },
        Candidate {
            name: "bruno".into(),
            address: "bruno@example.com".into(),
            capabilities: vec!["grammar".into()],
            current_load: 5.0,
            max_hours: 40.0,
            availability: Availability::Vacation,
        },
    ]);
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(LocalSolver::new()),
        Arc::new(TemplateTextGenerator::new()),
        Arc::new(roster),
        Arc::new(ConsoleTransport::new()),
        Identity::default(),
        &config.collaborators,
    );
    let adapter = IngestionAdapter::new(DedupSource::MessageId, "coverdesk@localhost");
    (store, adapter, orchestrator)
}

#[tokio::test]
async fn delivery_becomes_assigned_task() {
    let (store, adapter, orchestrator) = wire();

    let raw = delivery("m-1", "Cover Thursday.\nSkills: conversation");
    let (message, event) = adapter.ingest(&raw).unwrap();
    let outcome = orchestrator.handle(message, event).await.unwrap();

    assert_eq!(outcome.task.status, TaskStatus::Assigned);
    assert_eq!(outcome.task.assignee.as_deref(), Some("ana"));

    let status = store.status(Utc::now()).await.unwrap();
    assert_eq!(status.open_tasks, 1);
    assert_eq!(status.confirmed_dispatches, 1);
    assert_eq!(status.hot_messages, 2); // inbound + notification
}

#[tokio::test]
async fn redelivered_webhook_payload_changes_nothing() {
    let (store, adapter, orchestrator) = wire();
    let raw = delivery("m-1", "Cover Thursday.\nSkills: conversation");

    let (m1, e1) = adapter.ingest(&raw).unwrap();
    let first = orchestrator.handle(m1, e1).await.unwrap();

    let (m2, e2) = adapter.ingest(&raw).unwrap();
    let second = orchestrator.handle(m2, e2).await.unwrap();

    assert_eq!(first.task.id, second.task.id);
    assert!(second.resumed);

    let status = store.status(Utc::now()).await.unwrap();
    assert_eq!(status.open_tasks, 1);
    assert_eq!(status.confirmed_dispatches, 1);
    assert_eq!(
        store
            .decisions_for_task(&first.task.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn unmatched_request_stays_pending_with_explanation() {
    let (store, adapter, orchestrator) = wire();
    let raw = delivery("m-2", "Need a welding instructor.\nSkills: welding");

    let (message, event) = adapter.ingest(&raw).unwrap();
    let outcome = orchestrator.handle(message, event).await.unwrap();

    assert_eq!(outcome.task.status, TaskStatus::Pending);
    let decision = outcome.decision.unwrap();
    assert!(decision.assignee.is_none());
    assert_eq!(decision.confidence, 0.0);

    // The explanatory notification still counts as a confirmed dispatch.
    let status = store.status(Utc::now()).await.unwrap();
    assert_eq!(status.confirmed_dispatches, 1);
}
