//! uptimed — the uptime monitoring daemon.
//!
//! Single binary that assembles:
//! - State store (redb)
//! - HTTP prober + webhook notifier
//! - Tick orchestrator (periodic check loop)
//! - REST API
//!
//! # Usage
//!
//! ```text
//! uptimed run --port 8080 --data-dir /var/lib/uptime
//! uptimed --config /etc/uptimed.toml tick     # one tick, for an external cron
//! ```

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uptime_health::{HttpProber, TickOrchestrator, WebhookNotifier};
use uptime_state::StateStore;

use crate::config::{DaemonConfig, Overrides, Settings};

#[derive(Parser)]
#[command(name = "uptimed", about = "HTTP uptime monitor daemon")]
struct Cli {
    /// Path to an uptimed.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for persistent state.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Webhook that receives DOWN and RECOVERED alerts.
    #[arg(long, global = true, env = "UPTIME_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server and the periodic checker.
    Run {
        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Period between ticks, e.g. "60s".
        #[arg(long)]
        tick_interval: Option<String>,

        /// Upper bound on a single probe, e.g. "30s".
        #[arg(long)]
        probe_timeout: Option<String>,

        /// Maximum probes in flight at once.
        #[arg(long)]
        max_concurrency: Option<usize>,
    },
    /// Run a single tick against the store and exit.
    Tick,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let file = match &cli.config {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };

    let mut overrides = Overrides {
        data_dir: cli.data_dir,
        webhook_url: cli.webhook_url,
        ..Overrides::default()
    };

    match cli.command {
        Command::Run {
            port,
            tick_interval,
            probe_timeout,
            max_concurrency,
        } => {
            overrides.port = port;
            overrides.tick_interval = tick_interval;
            overrides.probe_timeout = probe_timeout;
            overrides.max_concurrency = max_concurrency;
            run_daemon(file.resolve(overrides)?).await
        }
        Command::Tick => run_once(file.resolve(overrides)?).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,uptimed=debug,uptime=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("uptime.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

fn build_orchestrator(store: &StateStore, settings: &Settings) -> anyhow::Result<TickOrchestrator> {
    let prober = HttpProber::new(&settings.checker)?;
    let notifier = WebhookNotifier::new(settings.webhook_url.clone(), settings.checker.probe_timeout)?;
    if !notifier.is_configured() {
        warn!("no webhook URL configured, alerts will only be logged");
    }

    Ok(TickOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(prober),
        Arc::new(notifier),
        settings.checker.clone(),
    ))
}

async fn run_daemon(settings: Settings) -> anyhow::Result<()> {
    info!("uptime daemon starting");

    let store = open_store(&settings.data_dir)?;
    let orchestrator = build_orchestrator(&store, &settings)?;

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start checker loop ─────────────────────────────────────

    let checker_handle = tokio::spawn(async move {
        orchestrator.run(shutdown_rx).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = uptime_api::build_router(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for in-flight checks.
    let _ = checker_handle.await;

    info!("uptime daemon stopped");
    Ok(())
}

async fn run_once(settings: Settings) -> anyhow::Result<()> {
    let store = open_store(&settings.data_dir)?;
    let orchestrator = build_orchestrator(&store, &settings)?;

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let report = orchestrator.run_tick(now).await;

    if report.persist_failures > 0 {
        anyhow::bail!("{} check result(s) could not be persisted", report.persist_failures);
    }
    Ok(())
}
