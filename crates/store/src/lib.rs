//! Tiered in-memory implementation of the Coverdesk context store.
//!
//! One physical store, three logical tiers computed at read time. The
//! `ContextStore` trait lives in `coverdesk-core`; a database-backed
//! implementation would slot in behind the same trait.

mod in_memory;

pub use in_memory::InMemoryStore;
