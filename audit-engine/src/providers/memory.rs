use crate::{AuditLogger, AuditRecord, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory audit logger for testing and development
#[derive(Debug, Clone)]
pub struct InMemoryAuditLogger {
    name: String,
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl Default for InMemoryAuditLogger {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl InMemoryAuditLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn persist(&self, record: AuditRecord) -> Result<()> {
        self.records.write().push(record);
        Ok(())
    }
}
