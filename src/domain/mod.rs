//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod link_extractor;

pub use entities::{
    AUDIT_HEADER, AuditRecord, AuditStatus, ConversationRef, DispatchOutcome, FAILED_SUBJECT,
    MailMessage, SweepReport, UnsubscribeLink,
};
pub use errors::DomainError;
pub use link_extractor::extract;
