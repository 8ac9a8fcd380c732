//! `coverdesk serve` — the HTTP edge.
//!
//! Routes:
//! - `POST /v1/inbound` — one raw delivery; replies with the task outcome
//! - `GET  /v1/status`  — store tier counters
//! - `GET  /healthz`    — liveness probe
//!
//! The webhook is safe to retry: duplicate deliveries resume instead of
//! redoing, so an at-least-once upstream can POST the same payload freely.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use coverdesk_channels::RawInbound;
use coverdesk_config::AppConfig;
use coverdesk_core::error::OrchestrationError;
use coverdesk_core::store::ContextStore;
use serde::Serialize;
use tracing::info;

use super::{build_runtime, load_roster, Runtime};

type SharedRuntime = Arc<Runtime>;

#[derive(Serialize)]
struct InboundReply {
    task_id: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    resumed: bool,
    dispatched: bool,
}

#[derive(Serialize)]
struct ErrorReply {
    error: String,
}

/// Build the Axum router with all routes.
pub fn build_router(runtime: SharedRuntime) -> Router {
    Router::new()
        .route("/v1/inbound", post(inbound_handler))
        .route("/v1/status", get(status_handler))
        .route("/healthz", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(runtime)
}

pub async fn run(
    config: &AppConfig,
    port: Option<u16>,
    roster: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = load_roster(roster)?;
    let runtime = Arc::new(build_runtime(config, roster));

    let addr = format!(
        "{}:{}",
        config.serve.bind,
        port.unwrap_or(config.serve.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, build_router(runtime)).await?;
    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn status_handler(
    State(runtime): State<SharedRuntime>,
) -> Result<Json<coverdesk_core::store::StoreStatus>, (StatusCode, Json<ErrorReply>)> {
    match runtime.store.status(Utc::now()).await {
        Ok(status) => Ok(Json(status)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorReply {
                error: e.to_string(),
            }),
        )),
    }
}

async fn inbound_handler(
    State(runtime): State<SharedRuntime>,
    Json(delivery): Json<RawInbound>,
) -> Result<Json<InboundReply>, (StatusCode, Json<ErrorReply>)> {
    let (message, event) = runtime.adapter.ingest(&delivery).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorReply {
                error: e.to_string(),
            }),
        )
    })?;

    match runtime.orchestrator.handle(message, event).await {
        Ok(outcome) => Ok(Json(InboundReply {
            task_id: outcome.task.id.to_string(),
            status: outcome.task.status.to_string(),
            assignee: outcome.task.assignee.clone(),
            resumed: outcome.resumed,
            dispatched: outcome.dispatch.is_some(),
        })),
        Err(e) => {
            let code = match &e {
                OrchestrationError::Validation(_) => StatusCode::BAD_REQUEST,
                OrchestrationError::CollaboratorExhausted { .. }
                | OrchestrationError::Dispatch(_) => StatusCode::BAD_GATEWAY,
                OrchestrationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                code,
                Json(ErrorReply {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
