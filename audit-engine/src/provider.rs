use crate::entry::AuditRecord;
use crate::error::Result;
use async_trait::async_trait;

/// A backend that durably stores audit records.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Name used in diagnostics and dispatch failures.
    fn name(&self) -> &str;

    /// A fresh record for one event, or `None` to sit this event out.
    fn create_record(&self) -> Option<AuditRecord> {
        Some(AuditRecord::new())
    }

    async fn persist(&self, record: AuditRecord) -> Result<()>;
}
