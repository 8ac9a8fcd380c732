//! Error types for the Coverdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The propagation policy:
//! validation failures surface immediately and are never retried;
//! collaborator failures are retried with bounded backoff; logical conflicts
//! (duplicate dedup key, duplicate decision) are resolved by treating the
//! first writer as authoritative.

use thiserror::Error;

/// The top-level error type for all Coverdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Malformed or unrecognized inbound event. Never retried; no task created.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Unrecognized event kind: {0}")]
    UnknownEventKind(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// An external collaborator (optimizer, text generator, roster, transport)
/// is unreachable or returned something we refuse to propagate inward.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} unreachable: {reason}")]
    Unavailable { collaborator: String, reason: String },

    #[error("{collaborator} timed out after {timeout_secs}s")]
    Timeout { collaborator: String, timeout_secs: u64 },

    #[error("{collaborator} returned a malformed response: {reason}")]
    MalformedResponse { collaborator: String, reason: String },
}

/// Conditional-write conflicts and lookup failures in the context store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A decision already exists for this (task, attempt). Benign race
    /// signal: the existing decision wins.
    #[error("Decision already recorded for task {task_id} attempt {attempt}")]
    DuplicateDecision { task_id: String, attempt: u32 },

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Attempted backward status move. Status transitions are monotonic.
    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },
}

/// A full orchestration run failed after local retries were exhausted.
/// The task is left in its last safely-resumable state.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{collaborator} still failing after {attempts} attempts: {last_error}")]
    CollaboratorExhausted {
        collaborator: String,
        attempts: u32,
        last_error: CollaboratorError,
    },

    #[error("Store rejected write: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Transport failure after exhausting dispatch retries. The task stays
/// assigned, flagged undelivered; remediation is external.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Delivery to {to} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        to: String,
        attempts: u32,
        last_error: CollaboratorError,
    },
}
