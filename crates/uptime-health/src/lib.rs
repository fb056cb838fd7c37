//! uptime-health — the check-and-transition pipeline.
//!
//! Probes HTTP endpoints, runs each verdict through a hysteresis state
//! machine, persists the result, and alerts on confirmed outage and
//! recovery.
//!
//! # Architecture
//!
//! ```text
//! TickOrchestrator::run_tick(now)
//!   ├── CheckStore::list_monitors()
//!   ├── schedule::is_due()            filter
//!   └── per due monitor (bounded, one in flight per monitor)
//!       ├── CheckStore::get_monitor()  skip if changed since listing
//!       ├── Probe::probe()            → ProbeResult
//!       ├── transition::evaluate()    → Transition (+ optional Alert)
//!       ├── CheckStore::record_check() state + log, one transaction
//!       └── Notifier::notify()        best effort
//! ```
//!
//! # Hysteresis
//!
//! A monitor moves UP → RETRYING on its first failed probe and is re-probed
//! on every tick while retrying. Only after `CONFIRM_THRESHOLD` further
//! failures is it declared DOWN and a single alert sent. A single success
//! restores UP; leaving DOWN sends a single recovery alert.

pub mod config;
pub mod error;
pub mod notifier;
pub mod orchestrator;
pub mod prober;
pub mod schedule;
pub mod transition;

pub use config::CheckerConfig;
pub use error::{HealthError, HealthResult};
pub use notifier::{AlertEvent, Notifier, WebhookNotifier};
pub use orchestrator::{CheckStore, TickOrchestrator, TickReport};
pub use prober::{HttpProber, Probe, ProbeResult};
pub use transition::{Alert, AlertKind, CONFIRM_THRESHOLD, Transition};
