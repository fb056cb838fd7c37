//! Tick orchestrator — runs the check pipeline for every due monitor.
//!
//! Each tick lists monitors, filters the due set, and fans the checks out
//! as tasks. Within one monitor the steps are sequential (probe, transition,
//! persist, notify); across monitors there is no ordering. A failure in any
//! one monitor's pipeline never affects its siblings.
//!
//! Ticks may overlap when a previous tick is still finishing. An in-flight
//! set ensures at most one check per monitor runs at a time; a monitor
//! still being checked is skipped by the overlapping tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use uptime_state::{
    HealthStatus, LogEntry, Monitor, MonitorId, MonitorState, NewLogEntry, StateResult,
    StateStore,
};

use crate::config::CheckerConfig;
use crate::notifier::{AlertEvent, Notifier};
use crate::prober::{Probe, duration_ms};
use crate::schedule::is_due;
use crate::transition::{self, Transition};

/// The persistence operations the pipeline depends on.
pub trait CheckStore: Send + Sync {
    fn list_monitors(&self) -> StateResult<Vec<Monitor>>;

    fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>>;

    /// Write the new runtime state and the log entry as one atomic unit.
    fn record_check(
        &self,
        id: MonitorId,
        state: &MonitorState,
        entry: &NewLogEntry,
        checked_at: u64,
    ) -> StateResult<LogEntry>;
}

impl CheckStore for StateStore {
    fn list_monitors(&self) -> StateResult<Vec<Monitor>> {
        StateStore::list_monitors(self)
    }

    fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>> {
        StateStore::get_monitor(self, id)
    }

    fn record_check(
        &self,
        id: MonitorId,
        state: &MonitorState,
        entry: &NewLogEntry,
        checked_at: u64,
    ) -> StateResult<LogEntry> {
        StateStore::record_check(self, id, state, entry, checked_at)
    }
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Monitors listed from the store.
    pub total: usize,
    /// Monitors the scheduler found due.
    pub due: usize,
    /// Due monitors whose check ran to completion and was persisted.
    pub checked: usize,
    /// Due monitors skipped because a previous check was still running.
    pub skipped_in_flight: usize,
    /// Due monitors skipped because their stored state moved on after the
    /// listing, or they were deleted.
    pub skipped_stale: usize,
    /// Checks that hit a store error while reloading or persisting.
    pub persist_failures: usize,
    /// Alerts handed to the notifier.
    pub alerts: usize,
}

/// Result of one monitor's pipeline.
enum CheckOutcome {
    Recorded { alerted: bool },
    /// The listed snapshot no longer matches the store.
    Stale,
    PersistFailed,
}

/// Set of monitors with a check in progress.
type InFlight = Arc<Mutex<HashSet<MonitorId>>>;

/// Marks a monitor as being checked until dropped.
struct InFlightGuard {
    set: InFlight,
    id: MonitorId,
}

impl InFlightGuard {
    /// Claim `id`, or `None` if it is already claimed.
    fn acquire(set: &InFlight, id: MonitorId) -> Option<Self> {
        let mut ids = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.insert(id).then(|| Self {
            set: Arc::clone(set),
            id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut ids = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.remove(&self.id);
    }
}

/// Drives the check-and-transition pipeline, one tick at a time.
#[derive(Clone)]
pub struct TickOrchestrator {
    store: Arc<dyn CheckStore>,
    prober: Arc<dyn Probe>,
    notifier: Arc<dyn Notifier>,
    config: CheckerConfig,
    in_flight: InFlight,
    permits: Arc<Semaphore>,
}

impl TickOrchestrator {
    pub fn new(
        store: Arc<dyn CheckStore>,
        prober: Arc<dyn Probe>,
        notifier: Arc<dyn Notifier>,
        config: CheckerConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            store,
            prober,
            notifier,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            permits,
        }
    }

    /// Run one tick at `now` (epoch seconds) and wait for every check it started.
    pub async fn run_tick(&self, now: u64) -> TickReport {
        let mut report = TickReport::default();

        let monitors = match self.store.list_monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                error!(error = %e, "failed to list monitors, skipping tick");
                return report;
            }
        };
        report.total = monitors.len();

        let mut checks = JoinSet::new();
        for monitor in monitors.into_iter().filter(|m| is_due(m, now)) {
            report.due += 1;

            let Some(guard) = InFlightGuard::acquire(&self.in_flight, monitor.id) else {
                debug!(monitor_id = monitor.id, "previous check still running, skipping");
                report.skipped_in_flight += 1;
                continue;
            };

            let this = self.clone();
            checks.spawn(async move {
                let _guard = guard;
                // The semaphore is never closed.
                let _permit = this.permits.clone().acquire_owned().await.ok();
                this.check_monitor(monitor, now).await
            });
        }

        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok(CheckOutcome::Recorded { alerted }) => {
                    report.checked += 1;
                    report.alerts += usize::from(alerted);
                }
                Ok(CheckOutcome::Stale) => report.skipped_stale += 1,
                Ok(CheckOutcome::PersistFailed) => report.persist_failures += 1,
                Err(e) => error!(error = %e, "check task panicked"),
            }
        }

        info!(
            total = report.total,
            due = report.due,
            checked = report.checked,
            skipped = report.skipped_in_flight,
            stale = report.skipped_stale,
            persist_failures = report.persist_failures,
            alerts = report.alerts,
            "tick complete"
        );
        report
    }

    /// Probe one monitor, advance its state machine, persist, then notify.
    async fn check_monitor(&self, listed: Monitor, now: u64) -> CheckOutcome {
        // The listing predates the in-flight claim. A check that finished in
        // between has already consumed this snapshot.
        let monitor = match self.store.get_monitor(listed.id) {
            Ok(Some(current))
                if (current.status, current.retry_count, current.last_check)
                    == (listed.status, listed.retry_count, listed.last_check) =>
            {
                current
            }
            Ok(Some(_)) => {
                debug!(monitor_id = listed.id, "monitor checked since listing, skipping");
                return CheckOutcome::Stale;
            }
            Ok(None) => {
                debug!(monitor_id = listed.id, "monitor deleted since listing, skipping");
                return CheckOutcome::Stale;
            }
            Err(e) => {
                error!(monitor_id = listed.id, error = %e, "failed to reload monitor");
                return CheckOutcome::PersistFailed;
            }
        };

        let probe = self.prober.probe(&monitor).await;
        let transition = transition::evaluate(monitor.status, monitor.retry_count, &probe);
        log_transition(&monitor, &transition, &probe.reason, probe.latency_ms);

        let state = MonitorState {
            status: transition.status,
            retry_count: transition.retry_count,
            last_check: now,
        };
        if let Err(e) = self
            .store
            .record_check(monitor.id, &state, &probe.to_log_entry(), now)
        {
            // The transition is dropped; the next tick recomputes it from
            // the last stored state, alert included.
            if e.is_not_found() {
                debug!(monitor_id = monitor.id, "monitor deleted during check");
            } else {
                error!(monitor_id = monitor.id, error = %e, "failed to persist check result");
            }
            return CheckOutcome::PersistFailed;
        }

        let Some(alert) = transition.alert else {
            return CheckOutcome::Recorded { alerted: false };
        };
        let event = AlertEvent {
            monitor,
            alert,
            at: now,
        };
        self.notifier.notify(&event).await;
        CheckOutcome::Recorded { alerted: true }
    }

    /// Fire a tick every `tick_interval` until shutdown.
    ///
    /// Each tick runs as its own task so a slow tick never delays the next
    /// one. On shutdown, ticks already started are awaited.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.tick_interval.as_secs(),
            probe_timeout_ms = duration_ms(self.config.probe_timeout),
            max_concurrency = self.config.max_concurrency,
            "checker started"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = JoinSet::new();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    while ticks.try_join_next().is_some() {}
                    let this = self.clone();
                    ticks.spawn(async move { this.run_tick(epoch_secs()).await });
                }
                _ = shutdown.changed() => {
                    info!("checker shutting down");
                    break;
                }
            }
        }

        // Probes are bounded by probe_timeout, so this terminates.
        while ticks.join_next().await.is_some() {}
    }
}

fn log_transition(monitor: &Monitor, t: &Transition, reason: &str, latency_ms: u64) {
    match (monitor.status, t.status) {
        (HealthStatus::Up, HealthStatus::Up) => {
            debug!(monitor_id = monitor.id, latency_ms, "monitor up");
        }
        (_, HealthStatus::Retrying) => {
            info!(
                monitor_id = monitor.id,
                name = %monitor.name,
                retry_count = t.retry_count,
                reason,
                "probe failed, retrying"
            );
        }
        (HealthStatus::Retrying, HealthStatus::Down) => {
            warn!(monitor_id = monitor.id, name = %monitor.name, reason, "monitor is down");
        }
        (HealthStatus::Down, HealthStatus::Down) => {
            debug!(monitor_id = monitor.id, reason, "monitor still down");
        }
        (from, HealthStatus::Up) => {
            info!(monitor_id = monitor.id, name = %monitor.name, %from, latency_ms, "monitor up");
        }
        (from, to) => {
            debug!(monitor_id = monitor.id, %from, %to, "monitor transition");
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
