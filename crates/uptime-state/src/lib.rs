//! uptime-state — embedded state store for the uptime monitor.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for monitor definitions, their runtime health state, and the
//! append-only check log.
//!
//! # Architecture
//!
//! Monitors are JSON-serialized into a `u64`-keyed table. Check log entries
//! use composite `{monitor_id:020}:{seq:020}` keys so a monitor's history is
//! a single ordered range scan. Ids for both come from a sequence table that
//! is bumped inside the same write transaction as the insert.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
