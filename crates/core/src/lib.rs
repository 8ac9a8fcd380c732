//! # Coverdesk Core
//!
//! Core domain types and traits for the Coverdesk assignment agent:
//!
//! - **Messages, tasks, decisions** — the entities the tiered context store
//!   holds.
//! - **Collaborator traits** — optimizer, text generator, roster, outbound
//!   transport; external systems consumed only through request/response
//!   contracts.
//! - **ContextStore trait** — tiered memory with conditional writes.
//! - **Error taxonomy** — validation vs. collaborator vs. store vs.
//!   orchestration vs. dispatch failures, each with its own retry policy.
//!
//! This crate holds no I/O; implementations live in the `coverdesk-store`,
//! `coverdesk-solver`, `coverdesk-providers`, and `coverdesk-channels`
//! crates.

pub mod collaborator;
pub mod context;
pub mod decision;
pub mod error;
pub mod event;
pub mod identity;
pub mod message;
pub mod roster;
pub mod store;
pub mod task;

pub use collaborator::{
    Optimizer, OutboundTransport, RankedChoice, Recommendation, RenderedDecision, TextGenerator,
};
pub use context::MemoryContext;
pub use decision::Decision;
pub use error::{
    CollaboratorError, DispatchError, Error, OrchestrationError, Result, StoreError,
    ValidationError,
};
pub use event::{EventKind, InboundRequestEvent, OutboundNotification};
pub use identity::Identity;
pub use message::{Direction, Message, MessageId};
pub use roster::{Availability, Candidate, RosterSource, StaticRoster};
pub use store::{ContextStore, CreateOutcome, StoreStatus, Tier};
pub use task::{Priority, Task, TaskId, TaskStatus};
