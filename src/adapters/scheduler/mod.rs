//! Scheduler adapters. Implement SchedulerPort.

pub mod interval;

pub use interval::IntervalScheduler;
