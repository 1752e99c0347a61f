//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Audit log error: {0}")]
    AuditLog(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
