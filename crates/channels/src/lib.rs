//! Transport edges of Coverdesk.
//!
//! The ingestion adapter turns raw at-least-once deliveries into validated
//! [`coverdesk_core::InboundRequestEvent`]s; the console transport is the
//! default [`coverdesk_core::OutboundTransport`]. SMTP or chat transports
//! would live here too, behind the same traits.

mod console;
mod ingest;

pub use console::ConsoleTransport;
pub use ingest::{IngestionAdapter, RawInbound};
