//! Infrastructure adapters. Implement outbound ports.
//!
//! Mailbox, audit log, HTTP dispatch, scheduler. Map errors to DomainError.

pub mod audit;
pub mod http;
pub mod mailbox;
pub mod scheduler;
