use crate::{AuditError, AuditLogger, AuditRecord, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Appends one JSON document per line to a local file.
pub struct JsonFileAuditLogger {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonFileAuditLogger {
    /// The file is opened lazily on the first record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<File> {
        debug!(path = %self.path.display(), "Opening audit log file");
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AuditError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl AuditLogger for JsonFileAuditLogger {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn persist(&self, record: AuditRecord) -> Result<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        let file = match guard.take() {
            Some(file) => file,
            None => self.open().await?,
        };
        let file = guard.insert(file);

        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
