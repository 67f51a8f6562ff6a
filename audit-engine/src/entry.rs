// Audit event and record types
use crate::entity::Entity;
use crate::error::{AuditError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity mutations recorded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "Insert",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized description of one audited action plus who performed it.
///
/// Fields are private so that `event` stays non-empty and `item_type` /
/// `item_id` are either both set or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    event: String,
    item_data: String,
    item_type: Option<String>,
    item_id: Option<String>,
    user_id: Option<String>,
    user_ip: Option<String>,
}

impl AuditEvent {
    pub fn new(
        event: impl Into<String>,
        item_data: impl Into<String>,
        item: Option<&dyn Entity>,
        user_id: Option<String>,
        user_ip: Option<String>,
    ) -> Result<Self> {
        let event = event.into();
        if event.is_empty() {
            return Err(AuditError::InvalidArgument(
                "audit event name must not be empty".to_string(),
            ));
        }

        let (item_type, item_id) = match item {
            Some(entity) => (Some(entity.type_name().to_string()), Some(entity.id())),
            None => (None, None),
        };

        Ok(Self {
            event,
            item_data: item_data.into(),
            item_type,
            item_id,
            user_id,
            user_ip,
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn item_data(&self) -> &str {
        &self.item_data
    }

    pub fn item_type(&self) -> Option<&str> {
        self.item_type.as_deref()
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_ip(&self) -> Option<&str> {
        self.user_ip.as_deref()
    }
}

/// The instance a provider persists.
///
/// Providers hand out blank records from `create_record`; the dispatcher
/// fills the event fields before passing the record back to `persist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub event: String,
    pub item_data: String,
    pub item_type: Option<String>,
    pub item_id: Option<String>,
    pub user_id: Option<String>,
    pub user_ip: Option<String>,
}

impl Default for AuditRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditRecord {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            event: String::new(),
            item_data: String::new(),
            item_type: None,
            item_id: None,
            user_id: None,
            user_ip: None,
        }
    }

    pub fn populate(&mut self, event: &AuditEvent) {
        self.event.clone_from(&event.event);
        self.item_data.clone_from(&event.item_data);
        self.item_type.clone_from(&event.item_type);
        self.item_id.clone_from(&event.item_id);
        self.user_id.clone_from(&event.user_id);
        self.user_ip.clone_from(&event.user_ip);
    }
}
