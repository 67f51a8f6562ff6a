//! Rendering of entity data for audit payloads
//!
//! Inserts record a full snapshot, updates record only the changed fields and
//! deletes record the values the entity held before it was removed. The
//! bundled [`XmlChangeDescriber`] renders these as:
//!
//! ```text
//! <Data><Amount>10</Amount><Status>Open</Status></Data>
//! <DataChange><old><Status>Open</Status></old><new><Status>Paid</Status></new></DataChange>
//! ```

use crate::entity::Entity;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type FieldValues = BTreeMap<String, String>;

#[async_trait]
pub trait ChangeDescriber: Send + Sync {
    /// Full snapshot of the entity's current values.
    fn snapshot(&self, entity: &dyn Entity) -> String;

    /// Changed fields against the persisted state. Empty means nothing changed.
    async fn diff(&self, entity: &dyn Entity) -> Result<String>;

    /// Values the entity held before deletion.
    async fn pre_delete_snapshot(&self, entity: &dyn Entity) -> Result<String>;
}

/// Source of the last persisted values of an entity.
#[async_trait]
pub trait PersistedState: Send + Sync {
    async fn load(&self, type_name: &str, id: &str) -> Result<Option<FieldValues>>;
}

/// State source with nothing persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistedState;

#[async_trait]
impl PersistedState for NoPersistedState {
    async fn load(&self, _type_name: &str, _id: &str) -> Result<Option<FieldValues>> {
        Ok(None)
    }
}

/// In-memory persisted state for testing and development
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistedState {
    rows: Arc<DashMap<(String, String), FieldValues>>,
}

impl InMemoryPersistedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the entity's current values as its persisted row.
    pub fn save(&self, entity: &dyn Entity) {
        self.rows.insert(
            (entity.type_name().to_string(), entity.id()),
            entity.field_values(),
        );
    }

    pub fn remove(&self, entity: &dyn Entity) {
        self.rows
            .remove(&(entity.type_name().to_string(), entity.id()));
    }
}

#[async_trait]
impl PersistedState for InMemoryPersistedState {
    async fn load(&self, type_name: &str, id: &str) -> Result<Option<FieldValues>> {
        Ok(self
            .rows
            .get(&(type_name.to_string(), id.to_string()))
            .map(|row| row.value().clone()))
    }
}

/// Renders snapshots and change sets as XML fragments.
pub struct XmlChangeDescriber {
    state: Arc<dyn PersistedState>,
}

impl XmlChangeDescriber {
    pub fn new(state: Arc<dyn PersistedState>) -> Self {
        Self { state }
    }

    /// A describer with no persisted state: every field counts as changed.
    pub fn detached() -> Self {
        Self::new(Arc::new(NoPersistedState))
    }

    fn write_fields(out: &mut String, fields: &FieldValues) {
        for (name, value) in fields {
            let tag = xml_element_name(name);
            out.push('<');
            out.push_str(&tag);
            out.push('>');
            out.push_str(&escape_xml(value));
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
    }

    fn change_xml(old: &FieldValues, new: &FieldValues) -> String {
        let mut out = String::from("<DataChange><old>");
        Self::write_fields(&mut out, old);
        out.push_str("</old><new>");
        Self::write_fields(&mut out, new);
        out.push_str("</new></DataChange>");
        out
    }
}

/// Split two value sets into the old and new values of fields that differ.
pub fn changed_fields(before: &FieldValues, after: &FieldValues) -> (FieldValues, FieldValues) {
    let mut old = FieldValues::new();
    let mut new = FieldValues::new();

    for (name, value) in after {
        if before.get(name) != Some(value) {
            if let Some(previous) = before.get(name) {
                old.insert(name.clone(), previous.clone());
            }
            new.insert(name.clone(), value.clone());
        }
    }
    for (name, value) in before {
        if !after.contains_key(name) {
            old.insert(name.clone(), value.clone());
        }
    }

    (old, new)
}

#[async_trait]
impl ChangeDescriber for XmlChangeDescriber {
    fn snapshot(&self, entity: &dyn Entity) -> String {
        let mut out = String::from("<Data>");
        Self::write_fields(&mut out, &entity.field_values());
        out.push_str("</Data>");
        out
    }

    async fn diff(&self, entity: &dyn Entity) -> Result<String> {
        let before = self
            .state
            .load(entity.type_name(), &entity.id())
            .await?
            .unwrap_or_default();
        let (old, new) = changed_fields(&before, &entity.field_values());

        if old.is_empty() && new.is_empty() {
            return Ok(String::new());
        }
        Ok(Self::change_xml(&old, &new))
    }

    async fn pre_delete_snapshot(&self, entity: &dyn Entity) -> Result<String> {
        let held = match self.state.load(entity.type_name(), &entity.id()).await? {
            Some(row) => row,
            None => entity.field_values(),
        };
        Ok(Self::change_xml(&held, &FieldValues::new()))
    }
}

/// Turn a field name into a usable element name.
///
/// Characters other than letters, digits, `_`, `-` and `.` become `_`, and a
/// name that does not start with a letter or `_` gets a leading `_`.
pub fn xml_element_name(name: &str) -> String {
    let mut tag: String = name
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if !tag.starts_with(|ch: char| ch.is_alphabetic() || ch == '_') {
        tag.insert(0, '_');
    }
    tag
}

pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
