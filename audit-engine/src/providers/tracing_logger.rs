use crate::{AuditLogger, AuditRecord, Result};
use async_trait::async_trait;
use logger_redacted::PiiRedactor;
use tracing::info;

pub const AUDIT_TARGET: &str = "audit";

/// Writes audit records to the `audit` tracing target.
///
/// Client addresses and payloads go through the PII redactor first; the
/// subscriber decides where the lines end up.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger {
    redactor: PiiRedactor,
}

impl TracingAuditLogger {
    pub fn new(redactor: PiiRedactor) -> Self {
        Self { redactor }
    }

    fn redacted(&self, record: &AuditRecord) -> (Option<String>, String) {
        (
            record.user_ip.as_deref().map(|ip| self.redactor.redact_ip(ip)),
            self.redactor.redact(&record.item_data),
        )
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn persist(&self, record: AuditRecord) -> Result<()> {
        let (user_ip, item_data) = self.redacted(&record);

        info!(
            target: AUDIT_TARGET,
            record_id = %record.id,
            recorded_at = %record.recorded_at.to_rfc3339(),
            event = %record.event,
            item_type = record.item_type.as_deref().unwrap_or(""),
            item_id = record.item_id.as_deref().unwrap_or(""),
            user_id = record.user_id.as_deref().unwrap_or(""),
            user_ip = user_ip.as_deref().unwrap_or(""),
            item_data = %item_data,
            "Audit event recorded"
        );
        Ok(())
    }
}
