//! mailsweep: scheduled unsubscribe sweeper with Hexagonal Architecture.
//!
//! Conversations under a label are scanned for an unsubscribe link, the link is requested
//! once, the outcome is appended to an audit log and the conversation is trashed.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
