//! Command implementations and shared runtime wiring.

pub mod run;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use coverdesk_agent::Orchestrator;
use coverdesk_channels::{ConsoleTransport, IngestionAdapter};
use coverdesk_config::AppConfig;
use coverdesk_core::collaborator::{Optimizer, TextGenerator};
use coverdesk_core::roster::{Candidate, StaticRoster};
use coverdesk_providers::{HttpOptimizer, LlmTextGenerator, TemplateTextGenerator};
use coverdesk_solver::LocalSolver;
use coverdesk_store::InMemoryStore;
use tracing::info;

/// The wired pipeline shared by `run` and `serve`.
pub struct Runtime {
    pub store: Arc<InMemoryStore>,
    pub adapter: IngestionAdapter,
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the full pipeline from config. Collaborators are chosen by
/// configuration: a remote optimizer and LLM generator when URLs are set,
/// the built-in solver and template generator otherwise.
pub fn build_runtime(config: &AppConfig, roster: Vec<Candidate>) -> Runtime {
    let identity = config.identity.to_identity();
    let store = Arc::new(InMemoryStore::new(
        config.store.hot_window,
        chrono::Duration::days(config.store.warm_horizon_days),
    ));

    let optimizer: Arc<dyn Optimizer> = if config.collaborators.optimizer_url.is_empty() {
        Arc::new(LocalSolver::new())
    } else {
        Arc::new(HttpOptimizer::new(&config.collaborators.optimizer_url))
    };

    let text_generator: Arc<dyn TextGenerator> =
        if config.collaborators.text_generator_url.is_empty() {
            Arc::new(TemplateTextGenerator::new())
        } else {
            Arc::new(LlmTextGenerator::new(
                &config.collaborators.text_generator_url,
                std::env::var("COVERDESK_TEXTGEN_API_KEY").unwrap_or_default(),
                &config.collaborators.text_generator_model,
            ))
        };

    info!(
        optimizer = %optimizer.name(),
        text_generator = %text_generator.name(),
        roster_size = roster.len(),
        "Pipeline wired"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        optimizer,
        text_generator,
        Arc::new(StaticRoster::new(roster)),
        Arc::new(ConsoleTransport::new()),
        identity.clone(),
        &config.collaborators,
    ));

    Runtime {
        store,
        adapter: IngestionAdapter::new(config.dedup.source, identity.address),
        orchestrator,
    }
}

/// Load a roster from a JSON file: an array of candidate objects.
pub fn load_roster(path: Option<&Path>) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    match path {
        None => Ok(Vec::new()),
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let roster: Vec<Candidate> = serde_json::from_str(&raw)?;
            Ok(roster)
        }
    }
}
