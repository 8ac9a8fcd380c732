//! The orchestration core: one event in, at most one assignment out.
//!
//! [`Orchestrator::handle`] drives the full pipeline for a single inbound
//! request; [`DispatchGateway`] owns the idempotent outbound edge. Both are
//! plain structs over injected trait objects, so every collaborator and the
//! store can be swapped without touching the pipeline.

mod dispatch;
mod orchestrator;

pub use dispatch::{DispatchGateway, DispatchOutcome};
pub use orchestrator::{OrchestrationOutcome, Orchestrator};
