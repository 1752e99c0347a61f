//! In-memory audit log. Used by tests and as a dry-run sink.

use crate::domain::{AuditRecord, DomainError};
use crate::ports::AuditLogPort;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    header: Option<Vec<String>>,
    header_writes: usize,
    records: Vec<AuditRecord>,
    append_failure: Option<String>,
}

#[derive(Default)]
pub struct MemoryAuditLog {
    inner: Mutex<Inner>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent `append` fail with `message`.
    pub fn fail_appends(&self, message: &str) {
        self.lock().append_failure = Some(message.to_string());
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().records.clone()
    }

    pub fn header(&self) -> Option<Vec<String>> {
        self.lock().header.clone()
    }

    pub fn has_header(&self) -> bool {
        self.lock().header.is_some()
    }

    /// How many times the header row was actually written.
    pub fn header_writes(&self) -> usize {
        self.lock().header_writes
    }
}

#[async_trait::async_trait]
impl AuditLogPort for MemoryAuditLog {
    async fn ensure_header(&self, columns: &[&str]) -> Result<bool, DomainError> {
        let mut inner = self.lock();
        if inner.header.is_some() || !inner.records.is_empty() {
            return Ok(false);
        }
        inner.header = Some(columns.iter().map(|c| c.to_string()).collect());
        inner.header_writes += 1;
        Ok(true)
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let mut inner = self.lock();
        if let Some(msg) = &inner.append_failure {
            return Err(DomainError::AuditLog(msg.clone()));
        }
        inner.records.push(record.clone());
        Ok(())
    }
}
