// # ddnsd - DDNS Daemon
//
// The ddnsd daemon is a thin wiring layer. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Constructing the IP source and the Cloudflare provider
// 4. Running the scheduler until a shutdown signal arrives
//
// All reconciliation logic lives in ddns-core.
//
// ## Configuration
//
// ### Required
// - `CLOUDFLARE_API_TOKEN`: API token (Zone:Read, DNS:Edit)
// - `ZONE_NAME`: Zone containing the record (e.g. example.com)
// - `RECORD_NAME`: A record to manage (e.g. home.example.com)
//
// ### Optional
// - `DRY_RUN`: Log the intended change without applying it (default false)
// - `JOB_FREQUENCY`: Minutes between cycles; unset or 0 runs once
// - `LOG_LEVEL`: trace, debug, info, warn, error, or -4/0/4/8 (default info)
// - `IP_LOOKUP_URL`: Public IP service (default https://api.ipify.org?format=json)
// - `CLOUDFLARE_API_BASE`: API base URL (default https://api.cloudflare.com/client/v4)
// - `VERIFY_TOKEN`: Verify the token at startup (default true)
// - `MAX_RUNTIME_SECS`: Stop after this many seconds
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// export ZONE_NAME=example.com
// export RECORD_NAME=home.example.com
// export JOB_FREQUENCY=5
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DnsProvider, Reconciler, Scheduler, SchedulerEvent, StopReason};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    for warning in &config.warnings {
        warn!("{}", warning);
    }

    info!("Starting ddnsd daemon");
    info!(
        "Managing {} in zone {} [mode: {}]",
        config.record_name,
        config.zone_name,
        if config.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let (scheduler, events) = match startup(&config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        let event_log = tokio::spawn(log_events(events));

        let result = run_daemon(scheduler).await;

        // The scheduler is gone, so the event log drains and ends
        if let Err(e) = event_log.await {
            warn!("Event log task failed: {}", e);
        }

        match result {
            Ok(reason) => {
                info!("Daemon stopped: {:?}", reason);
                DdnsExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the collaborators and the scheduler, verifying the token if asked
async fn startup(config: &DdnsConfig) -> Result<(Scheduler, mpsc::Receiver<SchedulerEvent>)> {
    let ip_source = HttpIpSource::new(config.ip_lookup_url.as_str())
        .context("Failed to create IP source")?;
    let provider =
        CloudflareProvider::with_base_url(config.api_token.as_str(), config.api_base.as_str())
            .context("Failed to create Cloudflare provider")?;

    let provider: Arc<dyn DnsProvider> = Arc::new(provider);

    if config.verify_token {
        info!("Verifying {} API token", provider.provider_name());
        let token = provider
            .verify_token()
            .await
            .context("Failed to verify API token")?;

        if !token.is_active() {
            anyhow::bail!("API token is not active (status: {})", token.status);
        }
        info!("API token verified: {}", token.status);
    }

    let reconciler = Reconciler::new(Arc::new(ip_source), provider);
    let parts = Scheduler::new(reconciler, config.target(), config.scheduler_config())
        .context("Failed to create scheduler")?;

    Ok(parts)
}

/// Log scheduler events until the scheduler drops its sender
///
/// Returns the number of events seen.
async fn log_events(mut events: mpsc::Receiver<SchedulerEvent>) -> u64 {
    let mut seen = 0u64;
    let mut failed = 0u64;

    while let Some(event) = events.recv().await {
        seen += 1;
        match event {
            SchedulerEvent::Started { interval } => {
                debug!("Scheduler started (interval: {:?})", interval);
            }
            SchedulerEvent::CycleCompleted { cycle, outcome } => {
                debug!("Cycle {} completed: {}", cycle, outcome);
            }
            SchedulerEvent::CycleFailed { cycle } => {
                failed += 1;
                debug!("Cycle {} failed ({} failed so far)", cycle, failed);
            }
            SchedulerEvent::Stopped { reason } => {
                debug!("Scheduler stopped after {} failed cycle(s): {:?}", failed, reason);
            }
        }
    }

    seen
}

/// Run the scheduler until a shutdown signal or the runtime limit
async fn run_daemon(scheduler: Scheduler) -> Result<StopReason> {
    let shutdown = shutdown_signal().await?;

    let reason = scheduler
        .run_until(async move {
            let signal = shutdown.await;
            info!("Received shutdown signal: {}", signal);
        })
        .await;

    Ok(reason)
}

/// Install handlers for SIGTERM and SIGINT
///
/// Handlers are installed before the first cycle so that a signal arriving
/// during it is not lost. The returned future resolves with the name of the
/// signal received.
#[cfg(unix)]
async fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    })
}
