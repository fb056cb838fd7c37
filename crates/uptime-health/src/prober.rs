//! HTTP probe logic.
//!
//! One request per probe, no retries: retrying is the state machine's job,
//! one attempt per tick. Verdicts are evaluated in order:
//!
//! 1. transport failure (refused, DNS, TLS, timeout) → status 0
//! 2. non-2xx response → `HTTP <code>`
//! 3. 2xx and no keyword → ok
//! 4. 2xx and keyword → body must contain it

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use tracing::debug;
use uptime_state::{HttpMethod, Monitor, NewLogEntry};

use crate::config::CheckerConfig;
use crate::error::HealthResult;

/// Verdict of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// HTTP status code, or 0 when no response was received.
    pub status_code: u16,
    /// Wall-clock time from request start to verdict, body read included.
    pub latency_ms: u64,
    pub failed: bool,
    /// Empty on success.
    pub reason: String,
}

impl ProbeResult {
    fn transport_failure(reason: String, started: Instant) -> Self {
        Self {
            status_code: 0,
            latency_ms: elapsed_ms(started),
            failed: true,
            reason,
        }
    }

    /// Log row for this verdict.
    pub fn to_log_entry(&self) -> NewLogEntry {
        NewLogEntry {
            status_code: self.status_code,
            latency_ms: self.latency_ms,
            failed: self.failed,
            reason: self.reason.clone(),
        }
    }
}

/// Executes one check against a monitor's endpoint.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, monitor: &Monitor) -> ProbeResult;
}

/// Probe backed by a shared `reqwest` client.
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(config: &CheckerConfig) -> HealthResult<Self> {
        let mut headers = header::HeaderMap::new();
        // Ask caches and CDNs in front of the target to go to the origin.
        headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.probe_timeout)
            .build()?;

        Ok(Self {
            client,
            timeout: config.probe_timeout,
        })
    }

    async fn execute(&self, monitor: &Monitor, started: Instant) -> ProbeResult {
        let response = match self
            .client
            .request(method(monitor.method), &monitor.url)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(monitor_id = monitor.id, error = %e, "probe request failed");
                return ProbeResult::transport_failure(describe(&e), started);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeResult {
                status_code: status.as_u16(),
                latency_ms: elapsed_ms(started),
                failed: true,
                reason: format!("HTTP {}", status.as_u16()),
            };
        }

        let Some(keyword) = monitor.keyword.as_deref().filter(|k| !k.is_empty()) else {
            return ProbeResult {
                status_code: status.as_u16(),
                latency_ms: elapsed_ms(started),
                failed: false,
                reason: String::new(),
            };
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(monitor_id = monitor.id, error = %e, "probe body read failed");
                return ProbeResult::transport_failure(describe(&e), started);
            }
        };

        let found = body.contains(keyword);
        ProbeResult {
            status_code: status.as_u16(),
            latency_ms: elapsed_ms(started),
            failed: !found,
            reason: if found {
                String::new()
            } else {
                format!("Keyword \"{keyword}\" not found")
            },
        }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, monitor: &Monitor) -> ProbeResult {
        let started = Instant::now();
        // The client timeout covers the request; this outer bound also
        // covers the keyword body read.
        match tokio::time::timeout(self.timeout, self.execute(monitor, started)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(monitor_id = monitor.id, url = %monitor.url, "probe timed out");
                ProbeResult::transport_failure(
                    format!("probe timed out after {}ms", self.timeout.as_millis()),
                    started,
                )
            }
        }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Error message with its source chain, e.g.
/// `error sending request: tcp connect error: Connection refused`.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    if message.trim().is_empty() {
        "Network Error".to_string()
    } else {
        message
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
