//! Application configuration. Mailbox label, audit sheet, trigger cadence, dispatch timeout.

use crate::domain::DomainError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Label whose conversations are swept.
pub const DEFAULT_LABEL_TO_WATCH: &str = "Unsubscribe";
/// Index of the audit sheet (0 = first sheet).
pub const DEFAULT_LOG_SHEET_INDEX: usize = 0;
/// Minutes between scheduled runs.
pub const DEFAULT_TRIGGER_INTERVAL_MINUTES: u64 = 5;
/// Seconds before an unsubscribe request is abandoned.
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 25;
/// Handler name the recurring trigger is bound to.
pub const RUN_HANDLER_NAME: &str = "run";

/// Settings passed explicitly into the sweep. No process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub label_to_watch: String,
    pub log_sheet_index: usize,
    pub trigger_interval_minutes: u64,
    pub dispatch_timeout: Duration,
    /// Put the transport error into the Detail column when a link fails.
    /// Off by default: the audit log then matches the historic format (Detail always empty).
    pub record_dispatch_failures: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            label_to_watch: DEFAULT_LABEL_TO_WATCH.to_string(),
            log_sheet_index: DEFAULT_LOG_SHEET_INDEX,
            trigger_interval_minutes: DEFAULT_TRIGGER_INTERVAL_MINUTES,
            dispatch_timeout: Duration::from_secs(DEFAULT_DISPATCH_TIMEOUT_SECS),
            record_dispatch_failures: false,
        }
    }
}

/// Where audit rows are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// Directory of CSV sheets.
    Csv,
    /// libsql database file `audit.db`.
    Sqlite,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Label to sweep. Read from MAILSWEEP_LABEL_TO_WATCH.
    #[serde(default)]
    pub label_to_watch: Option<String>,

    /// Audit sheet index. Read from MAILSWEEP_LOG_SHEET_INDEX.
    #[serde(default)]
    pub log_sheet_index: Option<usize>,

    /// Minutes between runs (default 5). Read from MAILSWEEP_TRIGGER_INTERVAL_MINUTES.
    #[serde(default)]
    pub trigger_interval_minutes: Option<u64>,

    /// Unsubscribe request timeout in seconds (default 25). Read from MAILSWEEP_DISPATCH_TIMEOUT_SECS.
    #[serde(default)]
    pub dispatch_timeout_secs: Option<u64>,

    /// Write dispatch errors into the Detail column. Read from MAILSWEEP_RECORD_DISPATCH_FAILURES.
    #[serde(default)]
    pub record_dispatch_failures: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────
    /// Mailbox root; one subdirectory per label. Read from MAILSWEEP_MAILBOX_DIR.
    #[serde(default)]
    pub mailbox_dir: Option<String>,

    /// Audit workbook directory. Read from MAILSWEEP_AUDIT_DIR.
    #[serde(default)]
    pub audit_dir: Option<String>,

    /// `csv` (default) or `sqlite`. Read from MAILSWEEP_AUDIT_BACKEND.
    #[serde(default)]
    pub audit_backend: Option<AuditBackend>,

    /// Sweep once and exit instead of installing the trigger. Read from MAILSWEEP_RUN_ONCE.
    #[serde(default)]
    pub run_once: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("MAILSWEEP").try_parsing(true));
        if let Ok(path) = std::env::var("MAILSWEEP_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the label to sweep. Defaults to "Unsubscribe".
    pub fn label_to_watch_or_default(&self) -> String {
        self.label_to_watch
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL_TO_WATCH.to_string())
    }

    pub fn log_sheet_index_or_default(&self) -> usize {
        self.log_sheet_index.unwrap_or(DEFAULT_LOG_SHEET_INDEX)
    }

    /// Returns minutes between runs. Defaults to 5 if unset.
    pub fn trigger_interval_minutes_or_default(&self) -> u64 {
        self.trigger_interval_minutes
            .unwrap_or(DEFAULT_TRIGGER_INTERVAL_MINUTES)
    }

    /// Returns the dispatch timeout in seconds. Defaults to 25 if unset.
    pub fn dispatch_timeout_secs_or_default(&self) -> u64 {
        self.dispatch_timeout_secs
            .unwrap_or(DEFAULT_DISPATCH_TIMEOUT_SECS)
    }

    pub fn mailbox_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.mailbox_dir.as_deref().unwrap_or("./mailbox"))
    }

    pub fn audit_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.audit_dir.as_deref().unwrap_or("./audit"))
    }

    pub fn audit_backend_or_default(&self) -> AuditBackend {
        self.audit_backend.unwrap_or(AuditBackend::Csv)
    }

    pub fn run_once(&self) -> bool {
        self.run_once.unwrap_or(false)
    }

    /// Build the explicit sweep settings. Rejects zero interval and zero timeout.
    pub fn sweep_config(&self) -> Result<SweepConfig, DomainError> {
        let interval = self.trigger_interval_minutes_or_default();
        if interval == 0 {
            return Err(DomainError::Config(
                "trigger_interval_minutes must be at least 1".into(),
            ));
        }
        let timeout = self.dispatch_timeout_secs_or_default();
        if timeout == 0 {
            return Err(DomainError::Config(
                "dispatch_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(SweepConfig {
            label_to_watch: self.label_to_watch_or_default(),
            log_sheet_index: self.log_sheet_index_or_default(),
            trigger_interval_minutes: interval,
            dispatch_timeout: Duration::from_secs(timeout),
            record_dispatch_failures: self.record_dispatch_failures.unwrap_or(false),
        })
    }
}
