//! Cross-cutting settings shared by wiring and use cases.

pub mod config;
