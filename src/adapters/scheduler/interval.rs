//! In-process recurring triggers on tokio timers. Implements SchedulerPort.
//!
//! Handlers are registered by name up front; `ensure_recurring_trigger` binds a timer to a
//! registered handler at most once. Each trigger runs in its own task that awaits the
//! handler before waiting for the next tick, so one handler never overlaps itself. Missed
//! ticks are skipped rather than bursted.

use crate::domain::DomainError;
use crate::ports::{SchedulerPort, TriggerHandler, TriggerInfo, TriggerInstall};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

const SECS_PER_MINUTE: u64 = 60;

struct Trigger {
    every: Duration,
    task: JoinHandle<()>,
}

pub struct IntervalScheduler {
    handlers: HashMap<String, Arc<dyn TriggerHandler>>,
    triggers: Mutex<HashMap<String, Trigger>>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            triggers: Mutex::new(HashMap::new()),
        }
    }

    /// Make `handler` available under `handler.name()`.
    pub fn register(mut self, handler: Arc<dyn TriggerHandler>) -> Self {
        self.handlers.insert(handler.name().to_string(), handler);
        self
    }

    /// Stop and forget the trigger bound to `handler_name`. Returns whether one existed.
    pub async fn remove_trigger(&self, handler_name: &str) -> bool {
        match self.triggers.lock().await.remove(handler_name) {
            Some(trigger) => {
                trigger.task.abort();
                info!(handler = handler_name, "trigger removed");
                true
            }
            None => false,
        }
    }

    /// Abort every trigger task.
    pub async fn shutdown(&self) {
        let mut triggers = self.triggers.lock().await;
        for (name, trigger) in triggers.drain() {
            trigger.task.abort();
            info!(handler = %name, "trigger stopped");
        }
    }

    /// First deadline, one interval from now. None if the clock cannot represent two ticks.
    fn first_deadline(every: Duration) -> Option<Instant> {
        let first = Instant::now().checked_add(every)?;
        first.checked_add(every)?;
        Some(first)
    }

    fn spawn_loop(
        handler: Arc<dyn TriggerHandler>,
        start: Instant,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                info!(handler = handler.name(), "trigger fired");
                if let Err(e) = handler.on_trigger().await {
                    warn!(
                        handler = handler.name(),
                        error = %e,
                        "triggered run failed; retrying next tick"
                    );
                }
            }
        })
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SchedulerPort for IntervalScheduler {
    async fn ensure_recurring_trigger(
        &self,
        handler_name: &str,
        interval_minutes: u64,
    ) -> Result<TriggerInstall, DomainError> {
        if interval_minutes == 0 {
            return Err(DomainError::Scheduler(
                "interval must be at least one minute".into(),
            ));
        }
        let handler = self.handlers.get(handler_name).cloned().ok_or_else(|| {
            DomainError::Scheduler(format!("no handler registered as {:?}", handler_name))
        })?;

        let mut triggers = self.triggers.lock().await;
        if let Some(existing) = triggers.get(handler_name) {
            info!(
                handler = handler_name,
                every_secs = existing.every.as_secs(),
                "trigger already installed"
            );
            return Ok(TriggerInstall::AlreadyInstalled);
        }

        let too_large = || {
            DomainError::Scheduler(format!(
                "interval of {} minutes is too large",
                interval_minutes
            ))
        };
        let every = interval_minutes
            .checked_mul(SECS_PER_MINUTE)
            .map(Duration::from_secs)
            .ok_or_else(too_large)?;
        let start = Self::first_deadline(every).ok_or_else(too_large)?;
        let task = Self::spawn_loop(handler, start, every);
        triggers.insert(handler_name.to_string(), Trigger { every, task });
        info!(handler = handler_name, interval_minutes, "trigger installed");
        Ok(TriggerInstall::Installed)
    }

    async fn triggers(&self) -> Vec<TriggerInfo> {
        let triggers = self.triggers.lock().await;
        let mut out: Vec<TriggerInfo> = triggers
            .iter()
            .map(|(name, t)| TriggerInfo {
                handler_name: name.clone(),
                every: t.every,
            })
            .collect();
        out.sort_by(|a, b| a.handler_name.cmp(&b.handler_name));
        out
    }
}
