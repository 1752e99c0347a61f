//! Audit log adapters. Implement AuditLogPort.
//!
//! CSV workbook (default), SQLite via libsql, and an in-memory log for tests.

pub mod csv_sheet;
pub mod memory_log;
pub mod sqlite_log;

pub use csv_sheet::CsvWorkbookLog;
pub use memory_log::MemoryAuditLog;
pub use sqlite_log::SqliteAuditLog;
