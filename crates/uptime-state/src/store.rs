//! StateStore — redb-backed persistence for monitors and check logs.
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing). `record_check` is the write path used by the checker: the
//! monitor's runtime state and its log entry commit in one transaction,
//! so readers never observe one without the other.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(MONITORS).map_err(map_err!(Table))?;
        txn.open_table(LOGS).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Monitors ───────────────────────────────────────────────────

    /// Insert a new monitor in its initial state (UP, no retries, never checked).
    pub fn create_monitor(&self, new: &NewMonitor, now: u64) -> StateResult<Monitor> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id = next_sequence(&txn, MONITOR_SEQUENCE)?;
        let monitor = Monitor {
            id,
            name: new.name.clone(),
            url: new.url.clone(),
            method: new.method,
            interval_secs: new.interval_secs,
            keyword: new.keyword.clone(),
            status: HealthStatus::Up,
            retry_count: 0,
            last_check: None,
            created_at: now,
        };
        let value = serde_json::to_vec(&monitor).map_err(map_err!(Codec))?;
        {
            let mut table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(monitor_id = id, url = %monitor.url, "monitor created");
        Ok(monitor)
    }

    /// Get a monitor by id.
    pub fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Storage))? {
            Some(guard) => {
                let monitor: Monitor =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Codec))?;
                Ok(Some(monitor))
            }
            None => Ok(None),
        }
    }

    /// List all monitors, ordered by id.
    pub fn list_monitors(&self) -> StateResult<Vec<Monitor>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Storage))? {
            let (_, value) = entry.map_err(map_err!(Storage))?;
            let monitor: Monitor =
                serde_json::from_slice(value.value()).map_err(map_err!(Codec))?;
            results.push(monitor);
        }
        Ok(results)
    }

    /// Delete a monitor and its check log. Returns true if it existed.
    pub fn delete_monitor(&self, id: MonitorId) -> StateResult<bool> {
        let (start, end) = log_range(id);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        let purged;
        {
            let mut table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Storage))?.is_some();
        }
        {
            let mut logs = txn.open_table(LOGS).map_err(map_err!(Table))?;
            let keys = logs
                .range(start.as_str()..end.as_str())
                .map_err(map_err!(Storage))?
                .map(|entry| {
                    entry
                        .map(|(k, _)| k.value().to_string())
                        .map_err(map_err!(Storage))
                })
                .collect::<StateResult<Vec<String>>>()?;
            for key in &keys {
                logs.remove(key.as_str()).map_err(map_err!(Storage))?;
            }
            purged = keys.len();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(monitor_id = id, existed, purged, "monitor deleted");
        Ok(existed)
    }

    /// Overwrite the runtime state of a monitor, leaving its configuration
    /// untouched.
    pub fn update_monitor_state(&self, id: MonitorId, state: &MonitorState) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        write_state(&txn, id, state)?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Check log ──────────────────────────────────────────────────

    /// Append a log entry for a monitor.
    pub fn append_log(
        &self,
        monitor_id: MonitorId,
        entry: &NewLogEntry,
        created_at: u64,
    ) -> StateResult<LogEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let log = write_log(&txn, monitor_id, entry, created_at)?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(log)
    }

    /// Persist the outcome of one check: runtime state and log entry commit
    /// together or not at all.
    pub fn record_check(
        &self,
        id: MonitorId,
        state: &MonitorState,
        entry: &NewLogEntry,
        checked_at: u64,
    ) -> StateResult<LogEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // An error here drops `txn` uncommitted, which aborts it.
        write_state(&txn, id, state)?;
        let log = write_log(&txn, id, entry, checked_at)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(monitor_id = id, status = %state.status, log_id = log.id, "check recorded");
        Ok(log)
    }

    /// Most recent log entries for a monitor, newest first.
    pub fn list_logs_for_monitor(
        &self,
        monitor_id: MonitorId,
        limit: usize,
    ) -> StateResult<Vec<LogEntry>> {
        let (start, end) = log_range(monitor_id);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(LOGS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range(start.as_str()..end.as_str())
            .map_err(map_err!(Storage))?
            .rev()
            .take(limit)
        {
            let (_, value) = entry.map_err(map_err!(Storage))?;
            let log: LogEntry = serde_json::from_slice(value.value()).map_err(map_err!(Codec))?;
            results.push(log);
        }
        Ok(results)
    }
}

/// Bump and return the named counter. Starts at 1.
fn next_sequence(txn: &WriteTransaction, name: &str) -> StateResult<u64> {
    let mut table = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
    let current = table
        .get(name)
        .map_err(map_err!(Storage))?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let next = current + 1;
    table.insert(name, next).map_err(map_err!(Storage))?;
    Ok(next)
}

fn write_state(txn: &WriteTransaction, id: MonitorId, state: &MonitorState) -> StateResult<()> {
    let mut table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
    let mut monitor: Monitor = match table.get(id).map_err(map_err!(Storage))? {
        Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Codec))?,
        None => return Err(StateError::MonitorNotFound(id)),
    };
    monitor.status = state.status;
    monitor.retry_count = state.retry_count;
    monitor.last_check = Some(state.last_check);
    let value = serde_json::to_vec(&monitor).map_err(map_err!(Codec))?;
    table
        .insert(id, value.as_slice())
        .map_err(map_err!(Storage))?;
    Ok(())
}

fn write_log(
    txn: &WriteTransaction,
    monitor_id: MonitorId,
    entry: &NewLogEntry,
    created_at: u64,
) -> StateResult<LogEntry> {
    let id = next_sequence(txn, LOG_SEQUENCE)?;
    let log = LogEntry {
        id,
        monitor_id,
        status_code: entry.status_code,
        latency_ms: entry.latency_ms,
        failed: entry.failed,
        reason: entry.reason.clone(),
        created_at,
    };
    let key = log.table_key();
    let value = serde_json::to_vec(&log).map_err(map_err!(Codec))?;
    let mut table = txn.open_table(LOGS).map_err(map_err!(Table))?;
    table
        .insert(key.as_str(), value.as_slice())
        .map_err(map_err!(Storage))?;
    Ok(log)
}
