//! uptimed.toml configuration parser.
//!
//! Every field is optional; anything left unset falls back to the CLI flag
//! and then to the built-in default.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use uptime_health::CheckerConfig;
use uptime_health::config::parse_duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "/var/lib/uptime";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub server: Option<ServerConfig>,
    pub checker: Option<CheckerSection>,
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerSection {
    pub tick_interval: Option<String>,
    pub probe_timeout: Option<String>,
    pub max_concurrency: Option<usize>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

/// Values given on the command line. These win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub tick_interval: Option<String>,
    pub probe_timeout: Option<String>,
    pub max_concurrency: Option<usize>,
    pub webhook_url: Option<String>,
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_dir: PathBuf,
    pub checker: CheckerConfig,
    pub webhook_url: Option<String>,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Merge file values with CLI overrides and validate the result.
    pub fn resolve(self, cli: Overrides) -> anyhow::Result<Settings> {
        let server = self.server.unwrap_or_default();
        let checker = self.checker.unwrap_or_default();
        let notify = self.notify.unwrap_or_default();
        let defaults = CheckerConfig::default();

        let tick_interval = match cli.tick_interval.or(checker.tick_interval) {
            Some(s) => duration("tick_interval", &s)?,
            None => defaults.tick_interval,
        };
        let probe_timeout = match cli.probe_timeout.or(checker.probe_timeout) {
            Some(s) => duration("probe_timeout", &s)?,
            None => defaults.probe_timeout,
        };

        let checker = CheckerConfig {
            tick_interval,
            probe_timeout,
            max_concurrency: cli
                .max_concurrency
                .or(checker.max_concurrency)
                .unwrap_or(defaults.max_concurrency),
            user_agent: checker
                .user_agent
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        };
        checker.validate()?;

        Ok(Settings {
            port: cli.port.or(server.port).unwrap_or(DEFAULT_PORT),
            data_dir: cli
                .data_dir
                .or(server.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            checker,
            webhook_url: cli
                .webhook_url
                .or(notify.webhook_url)
                .filter(|u| !u.trim().is_empty()),
        })
    }
}

fn duration(field: &str, value: &str) -> anyhow::Result<std::time::Duration> {
    match parse_duration(value) {
        Some(d) => Ok(d),
        None => bail!("invalid duration for {field}: {value:?} (expected e.g. \"60s\", \"500ms\", \"1m\")"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = DaemonConfig::default().resolve(Overrides::default()).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/uptime"));
        assert_eq!(settings.checker, CheckerConfig::default());
        assert!(settings.webhook_url.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[server]
port = 9090
data_dir = "/tmp/uptime"

[checker]
tick_interval = "30s"
probe_timeout = "5000ms"
max_concurrency = 8
user_agent = "probe/2"

[notify]
webhook_url = "https://hooks.example.com/x"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        let settings = config.resolve(Overrides::default()).unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/uptime"));
        assert_eq!(settings.checker.tick_interval, Duration::from_secs(30));
        assert_eq!(settings.checker.probe_timeout, Duration::from_secs(5));
        assert_eq!(settings.checker.max_concurrency, 8);
        assert_eq!(settings.checker.user_agent, "probe/2");
        assert_eq!(
            settings.webhook_url.as_deref(),
            Some("https://hooks.example.com/x")
        );
    }

    #[test]
    fn cli_overrides_file() {
        let toml_str = r#"
[server]
port = 9090

[notify]
webhook_url = "https://file.example.com"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        let settings = config
            .resolve(Overrides {
                port: Some(7070),
                tick_interval: Some("2m".to_string()),
                webhook_url: Some("https://cli.example.com".to_string()),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(settings.port, 7070);
        assert_eq!(settings.checker.tick_interval, Duration::from_secs(120));
        assert_eq!(settings.webhook_url.as_deref(), Some("https://cli.example.com"));
    }

    #[test]
    fn rejects_bad_duration() {
        let err = DaemonConfig::default()
            .resolve(Overrides {
                tick_interval: Some("soon".to_string()),
                ..Overrides::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("tick_interval"));
    }

    #[test]
    fn rejects_timeout_not_shorter_than_tick() {
        let result = DaemonConfig::default().resolve(Overrides {
            tick_interval: Some("10s".to_string()),
            probe_timeout: Some("10s".to_string()),
            ..Overrides::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptimed.toml");
        std::fs::write(&path, "[checker]\nmax_concurrency = 4\n").unwrap();

        let config = DaemonConfig::from_file(&path).unwrap();
        assert_eq!(config.checker.unwrap().max_concurrency, Some(4));
        assert!(DaemonConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
