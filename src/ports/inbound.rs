//! Inbound port. The scheduler (adapter) calls into the application.

use crate::domain::DomainError;

/// A routine the scheduler can invoke by name.
#[async_trait::async_trait]
pub trait TriggerHandler: Send + Sync {
    /// Name triggers are bound to.
    fn name(&self) -> &str;

    /// Run once. Errors are logged by the scheduler; the next tick retries.
    async fn on_trigger(&self) -> Result<(), DomainError>;
}
