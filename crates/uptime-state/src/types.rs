//! Domain types for the uptime state store.
//!
//! A `Monitor` pairs configuration owned by the management API (url,
//! method, interval, keyword) with runtime health state owned by the
//! checker (status, retry count, last check). The checker only ever
//! writes the runtime half, through `MonitorState`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque monitor identifier, assigned by the store.
pub type MonitorId = u64;

/// Interval applied when a monitor is created without one.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

// ── Monitor ───────────────────────────────────────────────────────

/// A tracked HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Monitor {
    pub id: MonitorId,
    /// Display name used in alert messages.
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Seconds between checks while not retrying.
    pub interval_secs: u64,
    /// Substring that must appear in the response body, if set.
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub status: HealthStatus,
    /// Consecutive failed probes; only meaningful while `Retrying`.
    #[serde(default)]
    pub retry_count: u32,
    /// Unix timestamp of the last completed check.
    #[serde(default)]
    pub last_check: Option<u64>,
    /// Unix timestamp when the monitor was created.
    pub created_at: u64,
}

/// Configuration for a monitor about to be created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMonitor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub keyword: Option<String>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for NewMonitor {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            method: HttpMethod::default(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            keyword: None,
        }
    }
}

/// Runtime state written back after each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub status: HealthStatus,
    pub retry_count: u32,
    pub last_check: u64,
}

/// Liveness of a monitor as seen by the hysteresis state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Up,
    Retrying,
    Down,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Retrying => "RETRYING",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method used to probe a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Check log ─────────────────────────────────────────────────────

/// Immutable audit record of one check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    pub monitor_id: MonitorId,
    /// HTTP status code, or 0 when the request never got a response.
    pub status_code: u16,
    pub latency_ms: u64,
    pub failed: bool,
    pub reason: String,
    pub created_at: u64,
}

/// Check outcome about to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub status_code: u16,
    pub latency_ms: u64,
    pub failed: bool,
    pub reason: String,
}

impl LogEntry {
    /// Build the composite key for the logs table.
    pub fn table_key(&self) -> String {
        log_key(self.monitor_id, self.id)
    }
}

/// Composite key for a log entry. Zero-padding keeps lexicographic order
/// equal to numeric order.
pub(crate) fn log_key(monitor_id: MonitorId, log_id: u64) -> String {
    format!("{monitor_id:020}:{log_id:020}")
}

/// Key range `[start, end)` covering every log entry of a monitor.
pub(crate) fn log_range(monitor_id: MonitorId) -> (String, String) {
    // ';' sorts directly after ':'.
    (format!("{monitor_id:020}:"), format!("{monitor_id:020};"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&HealthStatus::Retrying).unwrap();
        assert_eq!(json, "\"RETRYING\"");
        let status: HealthStatus = serde_json::from_str("\"DOWN\"").unwrap();
        assert_eq!(status, HealthStatus::Down);
    }

    #[test]
    fn new_monitor_defaults() {
        let m: NewMonitor =
            serde_json::from_str(r#"{"name":"site","url":"https://example.com"}"#).unwrap();
        assert_eq!(m.method, HttpMethod::Get);
        assert_eq!(m.interval_secs, DEFAULT_INTERVAL_SECS);
        assert!(m.keyword.is_none());
    }

    #[test]
    fn unknown_method_is_rejected() {
        let res: Result<HttpMethod, _> = serde_json::from_str("\"TRACE\"");
        assert!(res.is_err());
    }

    #[test]
    fn log_keys_sort_numerically_within_monitor() {
        assert!(log_key(7, 9) < log_key(7, 10));
        assert!(log_key(7, u64::MAX) < log_key(8, 0));
        let (start, end) = log_range(7);
        let key = log_key(7, 42);
        assert!(start.as_str() <= key.as_str() && key.as_str() < end.as_str());
    }
}
