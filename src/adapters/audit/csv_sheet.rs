//! CSV workbook audit log. Implements AuditLogPort.
//!
//! A workbook is a directory of `*.csv` sheets ordered by file name; the sheet index picks
//! one. An empty workbook gets a `Sheet1.csv`. Rows are appended with the `csv` crate, so
//! subjects containing commas, quotes or newlines stay in one record.

use crate::domain::{AuditRecord, DomainError};
use crate::ports::AuditLogPort;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Sheet created when the workbook directory holds no sheets yet.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1.csv";

pub struct CsvWorkbookLog {
    sheet_path: PathBuf,
    /// Serializes header check + writes within this process.
    write_lock: Mutex<()>,
}

impl CsvWorkbookLog {
    /// Open sheet `sheet_index` of the workbook at `workbook_dir`.
    ///
    /// # Errors
    /// `DomainError::AuditLog` if the directory cannot be read or the index is out of range.
    pub async fn open(
        workbook_dir: impl AsRef<Path>,
        sheet_index: usize,
    ) -> Result<Self, DomainError> {
        let dir = workbook_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .map_err(|e| DomainError::AuditLog(format!("create workbook dir: {}", e)))?;

        let mut sheets = Self::list_sheets(dir).await?;
        if sheets.is_empty() {
            let first = dir.join(DEFAULT_SHEET_NAME);
            fs::write(&first, b"")
                .await
                .map_err(|e| DomainError::AuditLog(format!("create sheet: {}", e)))?;
            sheets.push(first);
        }

        let count = sheets.len();
        let sheet_path = sheets.into_iter().nth(sheet_index).ok_or_else(|| {
            DomainError::AuditLog(format!(
                "sheet index {} out of range ({} sheets in {})",
                sheet_index,
                count,
                dir.display()
            ))
        })?;
        info!(path = %sheet_path.display(), sheet_index, "audit sheet opened");

        Ok(Self {
            sheet_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn sheet_path(&self) -> &Path {
        &self.sheet_path
    }

    async fn list_sheets(dir: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let mut sheets = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                sheets.push(path);
            }
        }
        sheets.sort();
        Ok(sheets)
    }

    /// All rows of the sheet, header included, as raw cells.
    pub async fn rows(&self) -> Result<Vec<Vec<String>>, DomainError> {
        let raw = fs::read(&self.sheet_path)
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_slice());
        rdr.records()
            .map(|r| {
                r.map(|rec| rec.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|e| DomainError::AuditLog(e.to_string()))
            })
            .collect()
    }

    async fn is_empty(&self) -> Result<bool, DomainError> {
        let meta = fs::metadata(&self.sheet_path)
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        Ok(meta.len() == 0)
    }

    async fn append_row<I, S>(&self, cells: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let line = encode_row(cells)?;
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.sheet_path)
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        f.write_all(&line)
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        f.flush()
            .await
            .map_err(|e| DomainError::AuditLog(e.to_string()))?;
        Ok(())
    }
}

/// One CSV record, terminated by a newline.
fn encode_row<I, S>(cells: I) -> Result<Vec<u8>, DomainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(cells)
        .map_err(|e| DomainError::AuditLog(e.to_string()))?;
    wtr.into_inner()
        .map_err(|e| DomainError::AuditLog(e.to_string()))
}

#[async_trait::async_trait]
impl AuditLogPort for CsvWorkbookLog {
    async fn ensure_header(&self, columns: &[&str]) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;
        if !self.is_empty().await? {
            return Ok(false);
        }
        self.append_row(columns.iter()).await?;
        info!(path = %self.sheet_path.display(), "header row written");
        Ok(true)
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        self.append_row(record.to_row()).await
    }
}
