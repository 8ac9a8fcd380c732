//! Collaborator clients for Coverdesk.
//!
//! Everything here sits on the far side of a trait defined in
//! `coverdesk-core` and is injected into the orchestrator at construction.
//! The retry wrapper gives every collaborator the same bounded-backoff
//! treatment; the HTTP optimizer and LLM text generator talk to remote
//! services; the template generator is the deterministic offline default.

mod http_optimizer;
mod retry;
mod textgen;

pub use http_optimizer::HttpOptimizer;
pub use retry::call_with_retry;
pub use textgen::{LlmTextGenerator, TemplateTextGenerator};
