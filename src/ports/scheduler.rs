//! Scheduler outbound port. Installs recurring timers for trigger handlers.

use crate::domain::DomainError;
use std::time::Duration;

/// What `ensure_recurring_trigger` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerInstall {
    Installed,
    /// A trigger for the same handler already existed; nothing was created.
    AlreadyInstalled,
}

/// An installed trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInfo {
    pub handler_name: String,
    pub every: Duration,
}

/// Port for installing recurring triggers.
///
/// Implemented by adapters (e.g. a tokio interval loop). Handlers are resolved by name,
/// so installing twice for the same handler must not create a second timer.
#[async_trait::async_trait]
pub trait SchedulerPort: Send + Sync {
    /// Ensure `handler_name` runs every `interval_minutes`.
    ///
    /// # Errors
    /// Returns `DomainError::Scheduler` if the handler is unknown or the interval is zero.
    async fn ensure_recurring_trigger(
        &self,
        handler_name: &str,
        interval_minutes: u64,
    ) -> Result<TriggerInstall, DomainError>;

    /// Currently installed triggers.
    async fn triggers(&self) -> Vec<TriggerInfo>;
}
