//! Application use cases. Orchestrate domain logic via ports.

pub mod sweep_service;

pub use sweep_service::SweepService;
