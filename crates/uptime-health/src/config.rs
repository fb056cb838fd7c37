//! Checker configuration.

use std::time::Duration;

use crate::error::{HealthError, HealthResult};

pub const DEFAULT_USER_AGENT: &str = "Uptime-Monitor/1.0";

/// Explicit context for the check pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Period between ticks. Retrying monitors are re-probed once per tick.
    pub tick_interval: Duration,
    /// Upper bound on a single probe, body read included.
    pub probe_timeout: Duration,
    /// Maximum probes running at once within a tick.
    pub max_concurrency: usize,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(30),
            max_concurrency: 32,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckerConfig {
    /// Reject configurations that would let in-flight probes pile up.
    pub fn validate(&self) -> HealthResult<()> {
        if self.tick_interval.is_zero() {
            return Err(HealthError::Config("tick_interval must be non-zero".into()));
        }
        if self.probe_timeout.is_zero() || self.probe_timeout >= self.tick_interval {
            return Err(HealthError::Config(format!(
                "probe_timeout ({:?}) must be non-zero and shorter than tick_interval ({:?})",
                self.probe_timeout, self.tick_interval
            )));
        }
        if self.max_concurrency == 0 {
            return Err(HealthError::Config("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CheckerConfig::default().validate().unwrap();
    }

    #[test]
    fn probe_timeout_must_be_shorter_than_tick() {
        let config = CheckerConfig {
            probe_timeout: Duration::from_secs(60),
            ..CheckerConfig::default()
        };
        assert!(matches!(config.validate(), Err(HealthError::Config(_))));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = CheckerConfig {
            max_concurrency: 0,
            ..CheckerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration(" 30s "), Some(Duration::from_secs(30)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("-5s"), None);
        assert_eq!(parse_duration(""), None);
    }
}
