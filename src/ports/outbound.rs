//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    AuditRecord, ConversationRef, DispatchOutcome, DomainError, MailMessage, UnsubscribeLink,
};

/// Mailbox access. Lists conversations under a label, reads them, discards them.
#[async_trait::async_trait]
pub trait ConversationSource: Send + Sync {
    /// All conversations tagged with `label`, in the order they should be processed.
    ///
    /// Returns `DomainError::LabelNotFound` if the label does not exist.
    async fn conversations_by_label(&self, label: &str)
    -> Result<Vec<ConversationRef>, DomainError>;

    /// First message of the conversation (subject and raw body).
    async fn first_message(&self, conversation: &ConversationRef)
    -> Result<MailMessage, DomainError>;

    /// Move the conversation out of the label. Irreversible from the sweep's point of view.
    async fn discard(&self, conversation: &ConversationRef) -> Result<(), DomainError>;
}

/// Append-only audit table.
#[async_trait::async_trait]
pub trait AuditLogPort: Send + Sync {
    /// Write `columns` as the header row if the log is empty. Idempotent.
    ///
    /// Returns true if the header was written by this call.
    async fn ensure_header(&self, columns: &[&str]) -> Result<bool, DomainError>;

    /// Append one row. Errors are never swallowed here; the caller decides.
    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError>;
}

/// Follows an unsubscribe link. Infallible by contract: transport errors become `LinkFailed`.
#[async_trait::async_trait]
pub trait DispatchPort: Send + Sync {
    /// `None` yields `NoLinkFound` without touching the network.
    async fn dispatch(&self, link: Option<&UnsubscribeLink>) -> DispatchOutcome;
}
