//! Alert delivery.
//!
//! Delivery is best effort: one attempt per alert, failures are logged and
//! never reach the check pipeline.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, warn};
use uptime_state::Monitor;

use crate::error::HealthResult;
use crate::transition::{Alert, AlertKind};

/// A notification about one monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub monitor: Monitor,
    pub alert: Alert,
    /// Unix timestamp of the check that produced the alert.
    pub at: u64,
}

impl AlertEvent {
    pub fn kind(&self) -> AlertKind {
        self.alert.kind()
    }

    /// One-line summary used as the message info line.
    pub fn message(&self) -> String {
        match &self.alert {
            Alert::Down { reason } => format!("Monitor is DOWN: {reason}"),
            Alert::Recovered { latency_ms } => {
                format!("Monitor Recovered! Latency: {latency_ms}ms")
            }
        }
    }

    /// Full text body sent to the channel.
    pub fn render(&self) -> String {
        let time = DateTime::<Utc>::from_timestamp(self.at as i64, 0)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| self.at.to_string());
        format!(
            "[Uptime Monitor] {}\nURL: {}\nTime: {}\nInfo: {}",
            self.monitor.name,
            self.monitor.url,
            time,
            self.message()
        )
    }
}

/// Sink for alert events. Implementations must not fail the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &AlertEvent);
}

/// Posts alerts as WeCom-style `{"msgtype":"text"}` messages to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// `url` of `None` (or blank) disables delivery; events are dropped with a warning.
    pub fn new(url: Option<String>, timeout: Duration) -> HealthResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn payload(event: &AlertEvent) -> serde_json::Value {
        json!({
            "msgtype": "text",
            "text": { "content": event.render() },
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &AlertEvent) {
        let Some(url) = self.url.as_deref() else {
            warn!(
                monitor_id = event.monitor.id,
                kind = %event.kind(),
                "no webhook URL configured, alert dropped"
            );
            return;
        };

        match self.client.post(url).json(&Self::payload(event)).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(monitor_id = event.monitor.id, kind = %event.kind(), "alert delivered");
            }
            Ok(resp) => {
                warn!(
                    monitor_id = event.monitor.id,
                    kind = %event.kind(),
                    status = %resp.status(),
                    "webhook rejected alert"
                );
            }
            Err(e) => {
                error!(
                    monitor_id = event.monitor.id,
                    kind = %event.kind(),
                    error = %e,
                    "failed to send alert"
                );
            }
        }
    }
}
