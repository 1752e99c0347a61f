//! Unsubscribe dispatch adapters. Implement DispatchPort.
//!
//! reqwest-backed dispatcher for production and a static stub for tests and dry runs.

pub mod dispatcher;
pub mod static_dispatcher;

pub use dispatcher::HttpDispatcher;
pub use static_dispatcher::StaticDispatcher;
