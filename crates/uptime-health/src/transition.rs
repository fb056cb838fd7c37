//! Hysteresis state machine over UP / RETRYING / DOWN.
//!
//! `evaluate` is a pure function of the previous state, the previous
//! retry count, and one probe verdict:
//!
//! | from     | probe  | to       | retries   | alert     |
//! |----------|--------|----------|-----------|-----------|
//! | UP       | ok     | UP       | 0         | -         |
//! | UP       | failed | RETRYING | 1         | -         |
//! | RETRYING | failed | RETRYING | R + 1     | - (R < 3) |
//! | RETRYING | failed | DOWN     | R         | DOWN (R >= 3) |
//! | RETRYING | ok     | UP       | 0         | -         |
//! | DOWN     | failed | DOWN     | R         | -         |
//! | DOWN     | ok     | UP       | 0         | RECOVERED |
//!
//! DOWN keeps the retry count it was confirmed with. Nothing reads it while
//! DOWN and the next success resets it.

use std::fmt;

use uptime_state::HealthStatus;

use crate::prober::ProbeResult;

/// Failed probes while RETRYING before an outage is confirmed.
pub const CONFIRM_THRESHOLD: u32 = 3;

/// Alert category delivered to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Down,
    Recovered,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => f.write_str("DOWN"),
            Self::Recovered => f.write_str("RECOVERED"),
        }
    }
}

/// Alert produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Outage confirmed; carries the failing probe's reason.
    Down { reason: String },
    /// First success after an outage; carries that probe's latency.
    Recovered { latency_ms: u64 },
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::Down { .. } => AlertKind::Down,
            Self::Recovered { .. } => AlertKind::Recovered,
        }
    }

    /// Human-readable detail: the failure reason or the recovery latency.
    pub fn detail(&self) -> String {
        match self {
            Self::Down { reason } => reason.clone(),
            Self::Recovered { latency_ms } => format!("{latency_ms}ms"),
        }
    }
}

/// Outcome of feeding one probe verdict into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: HealthStatus,
    pub retry_count: u32,
    pub alert: Option<Alert>,
}

impl Transition {
    fn quiet(status: HealthStatus, retry_count: u32) -> Self {
        Self {
            status,
            retry_count,
            alert: None,
        }
    }
}

/// Compute the next state for a monitor from its previous state and a probe.
pub fn evaluate(status: HealthStatus, retry_count: u32, probe: &ProbeResult) -> Transition {
    use HealthStatus::*;

    if !probe.failed {
        return match status {
            Down => Transition {
                status: Up,
                retry_count: 0,
                alert: Some(Alert::Recovered {
                    latency_ms: probe.latency_ms,
                }),
            },
            Up | Retrying => Transition::quiet(Up, 0),
        };
    }

    match status {
        Up => Transition::quiet(Retrying, 1),
        Retrying if retry_count < CONFIRM_THRESHOLD => Transition::quiet(Retrying, retry_count + 1),
        Retrying => Transition {
            status: Down,
            retry_count,
            alert: Some(Alert::Down {
                reason: probe.reason.clone(),
            }),
        },
        Down => Transition::quiet(Down, retry_count),
    }
}
