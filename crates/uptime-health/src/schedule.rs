//! Due-check for monitors on a tick.

use uptime_state::{HealthStatus, Monitor};

/// Whether `monitor` should be probed on the tick at `now` (epoch seconds).
///
/// Retrying monitors are always due; the tick cadence is their backoff.
/// Otherwise a monitor is due once a full interval has elapsed since its
/// last check. A never-checked monitor counts as last checked at the epoch.
pub fn is_due(monitor: &Monitor, now: u64) -> bool {
    if monitor.status == HealthStatus::Retrying {
        return true;
    }
    let last_check = monitor.last_check.unwrap_or(0);
    now.saturating_sub(last_check) >= monitor.interval_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use uptime_state::HttpMethod;

    fn monitor(status: HealthStatus, last_check: Option<u64>) -> Monitor {
        Monitor {
            id: 1,
            name: "api".to_string(),
            url: "http://127.0.0.1/health".to_string(),
            method: HttpMethod::Get,
            interval_secs: 300,
            keyword: None,
            status,
            retry_count: if status == HealthStatus::Retrying { 1 } else { 0 },
            last_check,
            created_at: 0,
        }
    }

    #[test]
    fn never_checked_is_due() {
        assert!(is_due(&monitor(HealthStatus::Up, None), 1_700_000_000));
    }

    #[test]
    fn due_exactly_at_interval() {
        let now = 10_000;
        assert!(is_due(&monitor(HealthStatus::Up, Some(now - 300)), now));
    }

    #[test]
    fn not_due_one_second_early() {
        let now = 10_000;
        assert!(!is_due(&monitor(HealthStatus::Up, Some(now - 300 + 1)), now));
    }

    #[test]
    fn retrying_always_due() {
        let now = 10_000;
        assert!(is_due(&monitor(HealthStatus::Retrying, Some(now)), now));
        assert!(is_due(&monitor(HealthStatus::Retrying, Some(now - 1)), now));
    }

    #[test]
    fn down_follows_interval() {
        let now = 10_000;
        assert!(!is_due(&monitor(HealthStatus::Down, Some(now - 10)), now));
        assert!(is_due(&monitor(HealthStatus::Down, Some(now - 300)), now));
    }

    #[test]
    fn clock_behind_last_check_is_not_due() {
        assert!(!is_due(&monitor(HealthStatus::Up, Some(5_000)), 4_000));
    }
}
