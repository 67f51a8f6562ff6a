/// Read-only view over application settings.
///
/// Missing keys and unparseable values both yield `default`.
pub trait ConfigLookup: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;

    fn get_string(&self, key: &str, default: &str) -> String;
}

/// Parse the boolean spellings accepted in configuration files and env vars.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub const DEFAULT_AREA: &str = "Database";

/// Builds `<Area>:Audit:<Operation>:<Flag>` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditKeys {
    area: String,
}

impl Default for AuditKeys {
    fn default() -> Self {
        Self::new(DEFAULT_AREA)
    }
}

impl AuditKeys {
    pub fn new(area: impl Into<String>) -> Self {
        Self { area: area.into() }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    /// Whether the operation is recorded at all.
    pub fn action(&self, operation: &str) -> String {
        format!("{}:Audit:{}:Action", self.area, operation)
    }

    /// Whether the operation's data payload is captured.
    pub fn data(&self, operation: &str) -> String {
        format!("{}:Audit:{}:Data", self.area, operation)
    }
}
