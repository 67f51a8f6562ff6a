use dashmap::DashSet;
use std::collections::BTreeMap;

/// A persisted object whose mutations can be audited.
pub trait Entity: Send + Sync {
    /// Fully-qualified type name, recorded as the item type.
    fn type_name(&self) -> &str;

    fn id(&self) -> String;

    /// True for entities that are themselves audit records.
    ///
    /// Those are never audited, otherwise storing an audit row would
    /// produce another one.
    fn is_audit_event(&self) -> bool {
        false
    }

    /// Current field values keyed by field name.
    ///
    /// Names that are not valid XML element names are rewritten by
    /// [`xml_element_name`](crate::capture::xml_element_name) when rendered.
    fn field_values(&self) -> BTreeMap<String, String>;
}

/// Type-level switch deciding whether an entity type is audited.
pub trait LogPolicy: Send + Sync {
    fn should_log(&self, type_name: &str) -> bool;
}

/// Audits every type.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAll;

impl LogPolicy for LogAll {
    fn should_log(&self, _type_name: &str) -> bool {
        true
    }
}

/// Audits every type except the excluded ones.
#[derive(Debug, Default)]
pub struct TypeExclusionPolicy {
    excluded: DashSet<String>,
}

impl TypeExclusionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(self, type_name: impl Into<String>) -> Self {
        self.excluded.insert(type_name.into());
        self
    }

    pub fn add_exclusion(&self, type_name: impl Into<String>) {
        self.excluded.insert(type_name.into());
    }
}

impl LogPolicy for TypeExclusionPolicy {
    fn should_log(&self, type_name: &str) -> bool {
        !self.excluded.contains(type_name)
    }
}
