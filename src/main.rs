//! Wiring & DI. Entry point: bootstrap adapters, inject into the sweep, install the trigger.
//! No business logic here.

use dotenv::dotenv;
use mailsweep::adapters::audit::{CsvWorkbookLog, SqliteAuditLog};
use mailsweep::adapters::http::HttpDispatcher;
use mailsweep::adapters::mailbox::LabelDirSource;
use mailsweep::adapters::scheduler::IntervalScheduler;
use mailsweep::ports::{AuditLogPort, ConversationSource, DispatchPort, SchedulerPort};
use mailsweep::shared::config::{AppConfig, AuditBackend, RUN_HANDLER_NAME};
use mailsweep::usecases::SweepService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed; using defaults");
        AppConfig::default()
    });
    let sweep_cfg = cfg.sweep_config()?;
    info!(
        label = %sweep_cfg.label_to_watch,
        sheet = sweep_cfg.log_sheet_index,
        interval_minutes = sweep_cfg.trigger_interval_minutes,
        timeout_secs = sweep_cfg.dispatch_timeout.as_secs(),
        "configuration loaded"
    );

    // --- Mailbox ---
    let mailbox_dir = cfg.mailbox_dir_or_default();
    info!(path = %mailbox_dir.display(), "mailbox directory");
    let source: Arc<dyn ConversationSource> = Arc::new(LabelDirSource::new(&mailbox_dir));

    // --- Audit log ---
    let audit_dir = cfg.audit_dir_or_default();
    let audit: Arc<dyn AuditLogPort> = match cfg.audit_backend_or_default() {
        AuditBackend::Csv => Arc::new(
            CsvWorkbookLog::open(&audit_dir, sweep_cfg.log_sheet_index)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?,
        ),
        AuditBackend::Sqlite => Arc::new(
            SqliteAuditLog::connect(&audit_dir, sweep_cfg.log_sheet_index)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
        ),
    };

    // --- Dispatcher ---
    let dispatcher: Arc<dyn DispatchPort> = Arc::new(
        HttpDispatcher::new(sweep_cfg.dispatch_timeout).map_err(|e| anyhow::anyhow!("{}", e))?,
    );

    let interval_minutes = sweep_cfg.trigger_interval_minutes;
    let sweep = Arc::new(SweepService::new(source, audit, dispatcher, sweep_cfg));

    // --- First pass right away; setup failures are retried on the next tick ---
    match sweep.run().await {
        Ok(report) => info!(?report, "initial sweep finished"),
        Err(e) if cfg.run_once() => return Err(anyhow::anyhow!("{}", e)),
        Err(e) => warn!(error = %e, "initial sweep failed"),
    }
    if cfg.run_once() {
        return Ok(());
    }

    // --- Recurring trigger ---
    let scheduler = IntervalScheduler::new().register(sweep.clone());
    scheduler
        .ensure_recurring_trigger(RUN_HANDLER_NAME, interval_minutes)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    scheduler.shutdown().await;
    Ok(())
}
