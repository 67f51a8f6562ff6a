//! Integration tests for the audit dispatcher
//!
//! Covers the guard chain for entity mutations, custom events, concurrent
//! fan-out with partial provider failure, and resolver degradation.

use anyhow::anyhow;
use async_trait::async_trait;
use audit_engine::*;
use config_engine::{AuditKeys, MemoryConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Clone)]
struct Invoice {
    id: u32,
    status: String,
}

impl Invoice {
    fn new(status: &str) -> Self {
        Self {
            id: 7,
            status: status.to_string(),
        }
    }
}

impl Entity for Invoice {
    fn type_name(&self) -> &str {
        "Billing.Invoice"
    }

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn field_values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("Status".to_string(), self.status.clone())])
    }
}

/// An entity that is itself a stored audit row.
struct AuditRow;

impl Entity for AuditRow {
    fn type_name(&self) -> &str {
        "Audit.ApplicationEvent"
    }

    fn id(&self) -> String {
        "1".to_string()
    }

    fn is_audit_event(&self) -> bool {
        true
    }

    fn field_values(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

struct FailingLogger;

#[async_trait]
impl AuditLogger for FailingLogger {
    fn name(&self) -> &str {
        "failing"
    }

    async fn persist(&self, _record: AuditRecord) -> Result<()> {
        Err(AuditError::Storage("table is read-only".to_string()))
    }
}

struct DecliningLogger;

#[async_trait]
impl AuditLogger for DecliningLogger {
    fn name(&self) -> &str {
        "declining"
    }

    fn create_record(&self) -> Option<AuditRecord> {
        None
    }

    async fn persist(&self, _record: AuditRecord) -> Result<()> {
        Err(AuditError::Storage("should never be called".to_string()))
    }
}

/// Completes only once every barrier participant has arrived.
struct RendezvousLogger {
    barrier: Arc<Barrier>,
    inner: InMemoryAuditLogger,
}

#[async_trait]
impl AuditLogger for RendezvousLogger {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn persist(&self, record: AuditRecord) -> Result<()> {
        self.barrier.wait().await;
        self.inner.persist(record).await
    }
}

/// Appends its name to a shared call log whenever it hands out a record.
struct OrderedLogger {
    name: &'static str,
    calls: Arc<parking_lot::Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl AuditLogger for OrderedLogger {
    fn name(&self) -> &str {
        self.name
    }

    fn create_record(&self) -> Option<AuditRecord> {
        self.calls.lock().push(self.name);
        Some(AuditRecord::new())
    }

    async fn persist(&self, _record: AuditRecord) -> Result<()> {
        Ok(())
    }
}

/// Persisted state whose backing store is unreachable.
struct UnreachableState;

#[async_trait]
impl PersistedState for UnreachableState {
    async fn load(&self, _type_name: &str, _id: &str) -> Result<Option<FieldValues>> {
        Err(AuditError::Storage("connection refused".to_string()))
    }
}

fn all_actions_enabled() -> MemoryConfig {
    let keys = AuditKeys::default();
    MemoryConfig::new()
        .with(keys.action("Insert"), true)
        .with(keys.action("Update"), true)
        .with(keys.action("Delete"), true)
}

struct Harness {
    audit: AuditLog,
    memory: InMemoryAuditLogger,
    state: InMemoryPersistedState,
    config: MemoryConfig,
}

fn harness() -> Harness {
    let memory = InMemoryAuditLogger::default();
    let state = InMemoryPersistedState::new();
    let config = all_actions_enabled();

    let audit = AuditLog::builder()
        .config(config.clone())
        .describer(XmlChangeDescriber::new(Arc::new(state.clone())))
        .provider(memory.clone())
        .build();

    Harness {
        audit,
        memory,
        state,
        config,
    }
}

// =============================================================================
// Entity mutation guards
// =============================================================================

#[tokio::test]
async fn test_audit_rows_are_never_audited() {
    let h = harness();

    h.audit.record_insert(&AuditRow).await.unwrap();
    h.audit.record_update(&AuditRow).await.unwrap();
    h.audit.record_delete(&AuditRow).await.unwrap();

    assert!(h.memory.is_empty());
}

#[tokio::test]
async fn test_disabled_action_sends_nothing() {
    let h = harness();
    h.config.set(AuditKeys::default().action("Insert"), false);

    h.audit.record_insert(&Invoice::new("Open")).await.unwrap();
    assert!(h.memory.is_empty());

    // Other operations are unaffected
    h.audit.record_delete(&Invoice::new("Open")).await.unwrap();
    assert_eq!(h.memory.len(), 1);
    assert_eq!(h.memory.records()[0].event, "Delete");
}

#[tokio::test]
async fn test_actions_default_to_off() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder().provider(memory.clone()).build();

    audit.record_insert(&Invoice::new("Open")).await.unwrap();
    audit.record_update(&Invoice::new("Paid")).await.unwrap();
    audit.record_delete(&Invoice::new("Paid")).await.unwrap();

    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_excluded_type_is_skipped() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .config(all_actions_enabled())
        .policy(TypeExclusionPolicy::new().exclude("Billing.Invoice"))
        .provider(memory.clone())
        .build();

    audit.record_insert(&Invoice::new("Open")).await.unwrap();
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_area_prefix_changes_keys() {
    let memory = InMemoryAuditLogger::default();
    let keys = AuditKeys::new("Billing");
    let audit = AuditLog::builder()
        .area("Billing")
        .config(MemoryConfig::new().with(keys.action("Insert"), true))
        .provider(memory.clone())
        .build();

    audit.record_insert(&Invoice::new("Open")).await.unwrap();
    assert_eq!(memory.len(), 1);
}

// =============================================================================
// Data capture
// =============================================================================

#[tokio::test]
async fn test_insert_captures_snapshot() {
    let h = harness();
    h.audit.record_insert(&Invoice::new("Open")).await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Insert");
    assert_eq!(record.item_data, "<Data><Status>Open</Status></Data>");
    assert_eq!(record.item_type.as_deref(), Some("Billing.Invoice"));
    assert_eq!(record.item_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_insert_without_data_capture() {
    let h = harness();
    h.config.set(AuditKeys::default().data("Insert"), false);

    h.audit.record_insert(&Invoice::new("Open")).await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Insert");
    assert_eq!(record.item_data, "");
    assert_eq!(record.item_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_update_records_only_changes() {
    let h = harness();
    h.state.save(&Invoice::new("Open"));

    h.audit.record_update(&Invoice::new("Paid")).await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Update");
    assert_eq!(
        record.item_data,
        "<DataChange><old><Status>Open</Status></old><new><Status>Paid</Status></new></DataChange>"
    );
}

#[tokio::test]
async fn test_update_without_changes_is_not_recorded() {
    let h = harness();
    h.state.save(&Invoice::new("Open"));

    h.audit.record_update(&Invoice::new("Open")).await.unwrap();
    assert!(h.memory.is_empty());
}

#[tokio::test]
async fn test_update_without_data_capture_skips_diff() {
    let h = harness();
    h.state.save(&Invoice::new("Open"));
    h.config.set(AuditKeys::default().data("Update"), false);

    // Unchanged, but the diff is never computed so the update is still logged
    h.audit.record_update(&Invoice::new("Open")).await.unwrap();

    assert_eq!(h.memory.len(), 1);
    assert_eq!(h.memory.records()[0].item_data, "");
}

#[tokio::test]
async fn test_delete_captures_previous_values() {
    let h = harness();
    h.state.save(&Invoice::new("Paid"));

    h.audit.record_delete(&Invoice::new("Paid")).await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Delete");
    assert_eq!(
        record.item_data,
        "<DataChange><old><Status>Paid</Status></old><new></new></DataChange>"
    );
}

#[tokio::test]
async fn test_update_with_unreadable_state_records_without_data() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .config(all_actions_enabled())
        .describer(XmlChangeDescriber::new(Arc::new(UnreachableState)))
        .provider(memory.clone())
        .build();

    audit.record_update(&Invoice::new("Paid")).await.unwrap();

    // A failed diff is not an empty diff: the update is still recorded
    assert_eq!(memory.len(), 1);
    let record = &memory.records()[0];
    assert_eq!(record.event, "Update");
    assert_eq!(record.item_data, "");
    assert_eq!(record.item_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_delete_with_unreadable_state_records_without_data() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .config(all_actions_enabled())
        .describer(XmlChangeDescriber::new(Arc::new(UnreachableState)))
        .provider(memory.clone())
        .build();

    audit.record_delete(&Invoice::new("Paid")).await.unwrap();

    assert_eq!(memory.len(), 1);
    let record = &memory.records()[0];
    assert_eq!(record.event, "Delete");
    assert_eq!(record.item_data, "");
}

// =============================================================================
// Custom events
// =============================================================================

#[tokio::test]
async fn test_empty_event_name_is_invalid() {
    let h = harness();

    let result = h.audit.record_custom_event("", "data").await;
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));

    let result = h
        .audit
        .record_event_as("", "data", None, Some("user-42"), None)
        .await;
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));

    assert!(h.memory.is_empty());
}

#[tokio::test]
async fn test_explicit_login_event() {
    let first = InMemoryAuditLogger::new("first");
    let second = InMemoryAuditLogger::new("second");
    let audit = AuditLog::builder()
        .provider(first.clone())
        .provider(second.clone())
        .user_resolver(user_resolver(|| Err(anyhow!("must not be called"))))
        .build();

    audit
        .record_event_as("Login", "", None, Some("user-42"), Some("10.0.0.5"))
        .await
        .unwrap();

    for logger in [&first, &second] {
        let records = logger.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.event, "Login");
        assert_eq!(record.item_data, "");
        assert_eq!(record.item_type, None);
        assert_eq!(record.item_id, None);
        assert_eq!(record.user_id.as_deref(), Some("user-42"));
        assert_eq!(record.user_ip.as_deref(), Some("10.0.0.5"));
    }
}

#[tokio::test]
async fn test_custom_event_with_entity() {
    let h = harness();
    h.audit
        .record_event("Approved", "by manager", Some(&Invoice::new("Open")))
        .await
        .unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Approved");
    assert_eq!(record.item_type.as_deref(), Some("Billing.Invoice"));
    assert_eq!(record.item_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_prebuilt_event_is_dispatched() {
    let h = harness();
    let event = AuditEvent::new("Import", "42 rows", None, Some("svc".to_string()), None).unwrap();

    h.audit.record(&event).await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.event, "Import");
    assert_eq!(record.user_id.as_deref(), Some("svc"));
}

// =============================================================================
// Context resolution
// =============================================================================

#[tokio::test]
async fn test_resolvers_supply_user_and_ip() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .provider(memory.clone())
        .user_resolver(user_resolver(|| Ok(Some(UserIdentity::new("user-7")))))
        .ip_resolver(ip_resolver(|| Ok(Some("192.168.0.9".to_string()))))
        .build();

    audit.record_custom_event("Logout", "").await.unwrap();

    let record = &memory.records()[0];
    assert_eq!(record.user_id.as_deref(), Some("user-7"));
    assert_eq!(record.user_ip.as_deref(), Some("192.168.0.9"));
}

#[tokio::test]
async fn test_failing_user_resolver_yields_unknown_user() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .provider(memory.clone())
        .user_resolver(user_resolver(|| Err(anyhow!("no request context"))))
        .ip_resolver(ip_resolver(|| Ok(Some("10.0.0.5".to_string()))))
        .build();

    audit.record_custom_event("Logout", "").await.unwrap();

    let record = &memory.records()[0];
    assert_eq!(record.user_id, None);
    assert_eq!(record.user_ip.as_deref(), Some("10.0.0.5"));
}

#[tokio::test]
async fn test_configure_after_startup() {
    let h = harness();
    h.audit.configure(
        Some(user_resolver(|| Ok(Some(UserIdentity::new("user-1"))))),
        None,
    );

    h.audit.record_custom_event("Ping", "").await.unwrap();

    let record = &h.memory.records()[0];
    assert_eq!(record.user_id.as_deref(), Some("user-1"));
    assert_eq!(record.user_ip, None);
}

// =============================================================================
// Fan-out
// =============================================================================

#[tokio::test]
async fn test_partial_provider_failure_is_reported() {
    let first = InMemoryAuditLogger::new("first");
    let third = InMemoryAuditLogger::new("third");
    let audit = AuditLog::builder()
        .provider(first.clone())
        .provider(FailingLogger)
        .provider(third.clone())
        .build();

    let result = audit.record_custom_event("Export", "").await;

    assert_eq!(first.len(), 1);
    assert_eq!(third.len(), 1);
    match result {
        Err(AuditError::Dispatch(failure)) => {
            assert_eq!(failure.attempted, 3);
            assert_eq!(failure.failed_providers().collect::<Vec<_>>(), vec!["failing"]);
            assert!(failure.to_string().contains("table is read-only"));
        }
        other => panic!("expected dispatch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_declining_provider_is_skipped() {
    let memory = InMemoryAuditLogger::default();
    let audit = AuditLog::builder()
        .provider(DecliningLogger)
        .provider(memory.clone())
        .build();

    audit.record_custom_event("Export", "").await.unwrap();
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn test_no_providers_is_success() {
    let audit = AuditLog::default();
    audit.record_custom_event("Export", "").await.unwrap();
}

#[tokio::test]
async fn test_providers_persist_concurrently() {
    // Each provider blocks until both have started; sequential dispatch would hang.
    let barrier = Arc::new(Barrier::new(2));
    let first = InMemoryAuditLogger::new("first");
    let second = InMemoryAuditLogger::new("second");

    let audit = AuditLog::builder()
        .provider(RendezvousLogger {
            barrier: barrier.clone(),
            inner: first.clone(),
        })
        .provider(RendezvousLogger {
            barrier,
            inner: second.clone(),
        })
        .build();

    tokio::time::timeout(Duration::from_secs(5), audit.record_custom_event("Sync", ""))
        .await
        .expect("providers were not run concurrently")
        .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn test_runtime_registration_appends() {
    let audit = Arc::new(AuditLog::default());
    let memory = InMemoryAuditLogger::default();

    audit.record_custom_event("Before", "").await.unwrap();
    audit.register_provider(Arc::new(memory.clone()));
    audit.record_custom_event("After", "").await.unwrap();

    let events: Vec<String> = memory.records().into_iter().map(|r| r.event).collect();
    assert_eq!(events, vec!["After".to_string()]);
    assert_eq!(audit.provider_count(), 1);
}

#[tokio::test]
async fn test_file_and_memory_providers_together() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let memory = InMemoryAuditLogger::default();

    let audit = AuditLog::builder()
        .provider(JsonFileAuditLogger::new(&path))
        .provider(TracingAuditLogger::default())
        .provider(memory.clone())
        .build();

    audit
        .record_event_as("Login", "", None, Some("user-42"), Some("10.0.0.5"))
        .await
        .unwrap();

    let line = tokio::fs::read_to_string(&path).await.unwrap();
    let stored: AuditRecord = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(stored.event, "Login");
    assert_eq!(stored.user_ip.as_deref(), Some("10.0.0.5"));
    assert_ne!(stored.id, memory.records()[0].id);
}

#[tokio::test]
async fn test_records_are_created_in_registration_order() {
    let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let logger = |name| OrderedLogger {
        name,
        calls: calls.clone(),
    };

    let audit = AuditLog::builder()
        .provider(logger("a"))
        .provider(logger("b"))
        .build();
    audit.register_provider(Arc::new(logger("c")));

    audit.record_custom_event("Export", "").await.unwrap();
    assert_eq!(*calls.lock(), vec!["a", "b", "c"]);

    audit.record_custom_event("Export", "").await.unwrap();
    assert_eq!(*calls.lock(), vec!["a", "b", "c", "a", "b", "c"]);
}
