//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the scheduler into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod outbound;
pub mod scheduler;

pub use inbound::TriggerHandler;
pub use outbound::{AuditLogPort, ConversationSource, DispatchPort};
pub use scheduler::{SchedulerPort, TriggerInfo, TriggerInstall};
