//! SQLite-backed audit log via libsql. Implements AuditLogPort.
//!
//! All sheets share one database file (`audit.db`); rows carry their sheet index and an
//! autoincrement sequence that preserves append order. The header of each sheet is kept in
//! its own table so that `ensure_header` stays idempotent across processes.

use crate::domain::{AuditRecord, AuditStatus, DomainError};
use crate::ports::AuditLogPort;
use chrono::{DateTime, Utc};
use libsql::{Database, params};
use std::path::{Path, PathBuf};
use tracing::info;

const AUDIT_LOG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS audit_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    subject TEXT NOT NULL,
    status TEXT NOT NULL,
    detail TEXT NOT NULL DEFAULT ''
)"#;
const AUDIT_LOG_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_audit_log_sheet_seq ON audit_log (sheet, seq)";

/// Header row per sheet, stored as a JSON array of column titles.
const AUDIT_HEADER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS audit_header (
    sheet INTEGER PRIMARY KEY,
    columns_json TEXT NOT NULL
)"#;

pub struct SqliteAuditLog {
    db: Database,
    db_path: PathBuf,
    sheet: i64,
}

impl SqliteAuditLog {
    /// Connect to (or create) `audit.db` under `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>, sheet_index: usize) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let db_path = base.join("audit.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;

        conn.execute(AUDIT_LOG_TABLE, ())
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        conn.execute(AUDIT_LOG_INDEX, ())
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        conn.execute(AUDIT_HEADER_TABLE, ())
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;

        let sheet = i64::try_from(sheet_index)
            .map_err(|_| DomainError::AuditLog(format!("sheet index {} too large", sheet_index)))?;
        info!(path = %db_path.display(), sheet, "SQLite audit log connected");

        Ok(Self { db, db_path, sheet })
    }

    fn connection(&self) -> Result<libsql::Connection, DomainError> {
        self.db
            .connect()
            .map_err(|e| DomainError::AuditLog(e.to_string()))
    }

    /// Header columns of this sheet, if written.
    pub async fn header(&self) -> Result<Option<Vec<String>>, DomainError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT columns_json FROM audit_header WHERE sheet = ?1",
                params![self.sheet],
            )
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?
        {
            Some(row) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| DomainError::AuditLog(e.to_string()))?;
                let columns = serde_json::from_str(&json)
                    .map_err(|e| DomainError::AuditLog(e.to_string()))?;
                Ok(Some(columns))
            }
            None => Ok(None),
        }
    }

    /// Records of this sheet in append order.
    pub async fn records(&self) -> Result<Vec<AuditRecord>, DomainError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                r#"
                SELECT timestamp, subject, status, detail
                FROM audit_log
                WHERE sheet = ?1
                ORDER BY seq ASC
                "#,
                params![self.sheet],
            )
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?
        {
            let timestamp: String = row
                .get(0)
                .map_err(|e| DomainError::AuditLog(e.to_string()))?;
            let status: String = row
                .get(2)
                .map_err(|e| DomainError::AuditLog(e.to_string()))?;
            records.push(AuditRecord {
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| DomainError::AuditLog(format!("bad timestamp: {}", e)))?,
                subject: row
                    .get::<String>(1)
                    .map_err(|e| DomainError::AuditLog(e.to_string()))?,
                status: AuditStatus::parse(&status)
                    .ok_or_else(|| DomainError::AuditLog(format!("unknown status: {}", status)))?,
                detail: row
                    .get::<String>(3)
                    .map_err(|e| DomainError::AuditLog(e.to_string()))?,
            });
        }
        Ok(records)
    }

    async fn row_count(&self, conn: &libsql::Connection) -> Result<i64, DomainError> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM audit_log WHERE sheet = ?1",
                params![self.sheet],
            )
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| DomainError::AuditLog(e.to_string())),
            None => Ok(0),
        }
    }
}

#[async_trait::async_trait]
impl AuditLogPort for SqliteAuditLog {
    async fn ensure_header(&self, columns: &[&str]) -> Result<bool, DomainError> {
        if self.header().await?.is_some() {
            return Ok(false);
        }
        let conn = self.connection()?;
        if self.row_count(&conn).await? > 0 {
            return Ok(false);
        }
        let json =
            serde_json::to_string(columns).map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let inserted = conn
            .execute(
                "INSERT INTO audit_header (sheet, columns_json) VALUES (?1, ?2) ON CONFLICT (sheet) DO NOTHING",
                params![self.sheet, json],
            )
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        if inserted > 0 {
            info!(path = %self.db_path.display(), sheet = self.sheet, "header row written");
        }
        Ok(inserted > 0)
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO audit_log (sheet, timestamp, subject, status, detail)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                self.sheet,
                record.timestamp.to_rfc3339(),
                record.subject.as_str(),
                record.status.as_str(),
                record.detail.as_str()
            ],
        )
        .await
        .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        Ok(())
    }
}
